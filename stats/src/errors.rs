use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("stat detection requires exactly 2 occupied ports, but this game has {0}")]
    PlayerCount(usize),
}
