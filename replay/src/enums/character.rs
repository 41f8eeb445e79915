use num_enum::TryFromPrimitive;
use strum::Display;

/// Character ids as selected on the character select screen. This is the id
/// recorded in the Game Start payload.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CSSCharacter {
    CaptainFalcon = 0,
    DonkeyKong = 1,
    Fox = 2,
    GameAndWatch = 3,
    Kirby = 4,
    Bowser = 5,
    Link = 6,
    Luigi = 7,
    Mario = 8,
    Marth = 9,
    Mewtwo = 10,
    Ness = 11,
    Peach = 12,
    Pikachu = 13,
    IceClimbers = 14,
    Jigglypuff = 15,
    Samus = 16,
    Yoshi = 17,
    Zelda = 18,
    Sheik = 19,
    Falco = 20,
    YoungLink = 21,
    DrMario = 22,
    Roy = 23,
    Pichu = 24,
    Ganondorf = 25,
    MasterHand = 26,
    WireframeMale = 27,
    WireframeFemale = 28,
    GigaBowser = 29,
    CrazyHand = 30,
    Sandbag = 31,
    Popo = 32,
}

/// In-game character ids as recorded per frame in Post-Frame payloads. These
/// differ from the CSS ids and can change mid-game only for Zelda/Sheik.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum InGameCharacter {
    Mario = 0,
    Fox = 1,
    CaptainFalcon = 2,
    DonkeyKong = 3,
    Kirby = 4,
    Bowser = 5,
    Link = 6,
    Sheik = 7,
    Ness = 8,
    Peach = 9,
    Popo = 10,
    Nana = 11,
    Pikachu = 12,
    Samus = 13,
    Yoshi = 14,
    Jigglypuff = 15,
    Mewtwo = 16,
    Luigi = 17,
    Marth = 18,
    Zelda = 19,
    YoungLink = 20,
    DrMario = 21,
    Falco = 22,
    Pichu = 23,
    GameAndWatch = 24,
    Ganondorf = 25,
    Roy = 26,
    MasterHand = 27,
    CrazyHand = 28,
    WireframeMale = 29,
    WireframeFemale = 30,
    GigaBowser = 31,
    Sandbag = 32,
}

impl CSSCharacter {
    /// Maps an in-game character id back to its select-screen counterpart.
    /// Both climbers fold into Ice Climbers.
    pub fn from_internal(internal: InGameCharacter) -> Self {
        match internal {
            InGameCharacter::Popo | InGameCharacter::Nana => Self::IceClimbers,
            InGameCharacter::Mario => Self::Mario,
            InGameCharacter::Fox => Self::Fox,
            InGameCharacter::CaptainFalcon => Self::CaptainFalcon,
            InGameCharacter::DonkeyKong => Self::DonkeyKong,
            InGameCharacter::Kirby => Self::Kirby,
            InGameCharacter::Bowser => Self::Bowser,
            InGameCharacter::Link => Self::Link,
            InGameCharacter::Sheik => Self::Sheik,
            InGameCharacter::Ness => Self::Ness,
            InGameCharacter::Peach => Self::Peach,
            InGameCharacter::Pikachu => Self::Pikachu,
            InGameCharacter::Samus => Self::Samus,
            InGameCharacter::Yoshi => Self::Yoshi,
            InGameCharacter::Jigglypuff => Self::Jigglypuff,
            InGameCharacter::Mewtwo => Self::Mewtwo,
            InGameCharacter::Luigi => Self::Luigi,
            InGameCharacter::Marth => Self::Marth,
            InGameCharacter::Zelda => Self::Zelda,
            InGameCharacter::YoungLink => Self::YoungLink,
            InGameCharacter::DrMario => Self::DrMario,
            InGameCharacter::Falco => Self::Falco,
            InGameCharacter::Pichu => Self::Pichu,
            InGameCharacter::GameAndWatch => Self::GameAndWatch,
            InGameCharacter::Ganondorf => Self::Ganondorf,
            InGameCharacter::Roy => Self::Roy,
            InGameCharacter::MasterHand => Self::MasterHand,
            InGameCharacter::CrazyHand => Self::CrazyHand,
            InGameCharacter::WireframeMale => Self::WireframeMale,
            InGameCharacter::WireframeFemale => Self::WireframeFemale,
            InGameCharacter::GigaBowser => Self::GigaBowser,
            InGameCharacter::Sandbag => Self::Sandbag,
        }
    }
}

/// Resolves a raw CSS character id to its name, passing unknown ids through.
pub fn character_name(id: u8) -> String {
    match CSSCharacter::try_from(id) {
        Ok(character) => character.to_string(),
        Err(_) => id.to_string(),
    }
}

/// Costume color names per character. Ids above the character's costume
/// count (or characters without alternate costumes) return `None`.
pub fn costume_name(character: CSSCharacter, costume: u8) -> Option<&'static str> {
    use CSSCharacter::*;

    let names: &[&'static str] = match character {
        CaptainFalcon => &["INDIGO", "BLACK", "RED", "WHITE", "GREEN", "BLUE"],
        DonkeyKong => &["BROWN", "BLACK", "RED", "BLUE", "GREEN"],
        Fox => &["WHITE", "RED", "BLUE", "GREEN"],
        GameAndWatch => &["BLACK", "RED", "BLUE", "GREEN"],
        Kirby => &["PINK", "YELLOW", "BLUE", "RED", "GREEN", "WHITE"],
        Bowser => &["GREEN", "RED", "BLUE", "BLACK"],
        Link => &["GREEN", "RED", "BLUE", "BLACK", "WHITE"],
        Luigi => &["GREEN", "WHITE", "BLUE", "RED"],
        Mario => &["RED", "YELLOW", "BLACK", "BLUE", "GREEN"],
        Marth => &["BLUE", "RED", "GREEN", "BLACK", "WHITE"],
        Mewtwo => &["PURPLE", "RED", "BLUE", "GREEN"],
        Ness => &["RED", "YELLOW", "BLUE", "GREEN"],
        Peach => &["RED", "YELLOW", "WHITE", "BLUE", "GREEN"],
        Pikachu => &["YELLOW", "RED", "BLUE", "GREEN"],
        IceClimbers => &["BLUE", "GREEN", "ORANGE", "RED"],
        Jigglypuff => &["PINK", "RED", "BLUE", "GREEN", "YELLOW"],
        Samus => &["RED", "PINK", "BLACK", "GREEN", "BLUE"],
        Yoshi => &["GREEN", "RED", "BLUE", "YELLOW", "PINK", "CYAN"],
        Zelda => &["PINK", "RED", "BLUE", "GREEN", "WHITE"],
        Sheik => &["NAVY", "RED", "BLUE", "GREEN", "WHITE"],
        Falco => &["TAN", "RED", "BLUE", "GREEN"],
        YoungLink => &["GREEN", "RED", "BLUE", "WHITE", "BLACK"],
        DrMario => &["WHITE", "RED", "BLUE", "GREEN", "BLACK"],
        Roy => &["PURPLE", "RED", "BLUE", "GREEN", "YELLOW"],
        Pichu => &["YELLOW", "RED", "BLUE", "GREEN"],
        Ganondorf => &["BROWN", "RED", "BLUE", "GREEN", "PURPLE"],
        _ => return None,
    };

    names.get(costume as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_ids_fold_climbers_together() {
        assert_eq!(CSSCharacter::from_internal(InGameCharacter::Popo), CSSCharacter::IceClimbers);
        assert_eq!(CSSCharacter::from_internal(InGameCharacter::Nana), CSSCharacter::IceClimbers);
        assert_eq!(CSSCharacter::from_internal(InGameCharacter::Falco), CSSCharacter::Falco);
    }

    #[test]
    fn costume_lookup_covers_known_colors() {
        assert_eq!(costume_name(CSSCharacter::Falco, 0), Some("TAN"));
        assert_eq!(costume_name(CSSCharacter::CaptainFalcon, 5), Some("BLUE"));
        assert_eq!(costume_name(CSSCharacter::Falco, 9), None);
        assert_eq!(costume_name(CSSCharacter::MasterHand, 0), None);
    }
}
