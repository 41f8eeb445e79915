use num_enum::TryFromPrimitive;
use strum::Display;

/// Stage ids as they appear in the Game Start payload.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum Stage {
    FountainOfDreams = 2,
    PokemonStadium = 3,
    PrincessPeachsCastle = 4,
    KongoJungle = 5,
    Brinstar = 6,
    Corneria = 7,
    YoshisStory = 8,
    Onett = 9,
    MuteCity = 10,
    RainbowCruise = 11,
    JungleJapes = 12,
    GreatBay = 13,
    HyruleTemple = 14,
    BrinstarDepths = 15,
    YoshisIsland = 16,
    GreenGreens = 17,
    Fourside = 18,
    MushroomKingdomI = 19,
    MushroomKingdomII = 20,
    Venom = 22,
    PokeFloats = 23,
    BigBlue = 24,
    IcicleMountain = 25,
    Icetop = 26,
    FlatZone = 27,
    DreamLandN64 = 28,
    YoshisIslandN64 = 29,
    KongoJungleN64 = 30,
    Battlefield = 31,
    FinalDestination = 32,
}

/// Resolves a raw stage id to its display name, passing unknown ids through
/// as bare numbers instead of failing.
pub fn stage_name(id: u16) -> String {
    match Stage::try_from(id) {
        Ok(stage) => stage.to_string(),
        Err(_) => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_resolve_to_names() {
        assert_eq!(stage_name(8), "YOSHIS_STORY");
        assert_eq!(stage_name(32), "FINAL_DESTINATION");
    }

    #[test]
    fn unknown_ids_pass_through() {
        assert_eq!(stage_name(21), "21");
    }
}
