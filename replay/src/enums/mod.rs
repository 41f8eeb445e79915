//! Version-pinned lookup data for the replay format: stage ids, character
//! ids, action-state ids, attack ids, and per-stage ground tables. These are
//! static tables the game engine defines; nothing in here is derived at
//! runtime.

pub mod action_state;
pub mod attack;
pub mod character;
pub mod ground;
pub mod stage;

pub use action_state::ActionState;
pub use attack::Attack;
pub use character::{CSSCharacter, InGameCharacter};
pub use stage::Stage;
