use super::stage::Stage;

/// Whether a ground id on the given stage is a floating platform rather
/// than part of the main stage surface.
///
/// Only the six tournament-legal stages have pinned ground tables; `None`
/// means the stage isn't covered and callers should fall back to a
/// positional heuristic.
pub fn is_platform(stage: Stage, ground_id: u16) -> Option<bool> {
    match stage {
        // 0 = Randall, 1/5 = side platforms, 4 = top platform,
        // 2/6 = slanted edges, 3 = main stage
        Stage::YoshisStory => Some(matches!(ground_id, 0 | 1 | 4 | 5)),

        // 2/4 = side platforms, 3 = top platform, 0/5 = edges, 1 = main stage
        Stage::Battlefield => Some(matches!(ground_id, 2 | 3 | 4)),

        // 0/1 = side platforms, 2 = top platform, 3/5 = edges, 4 = main stage
        Stage::DreamLandN64 => Some(matches!(ground_id, 0 | 1 | 2)),

        // 35/36 = side platforms, 34 = main stage, 51-54 = edges
        Stage::PokemonStadium => Some(matches!(ground_id, 35 | 36)),

        // 0/1 = side platforms, 2 = top platform, 5 = main stage, 3/4/6/7 = edges
        Stage::FountainOfDreams => Some(matches!(ground_id, 0 | 1 | 2)),

        // 1 = main stage, 0/2 = edges; no platforms at all
        Stage::FinalDestination => Some(false),

        _ => None,
    }
}
