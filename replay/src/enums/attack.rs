use num_enum::TryFromPrimitive;
use strum::Display;

/// Attack ids as recorded in the Post-Frame "last attack landed" field.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Attack {
    NonStaling = 1,
    #[strum(serialize = "JAB_1")]
    Jab1 = 2,
    #[strum(serialize = "JAB_2")]
    Jab2 = 3,
    #[strum(serialize = "JAB_3")]
    Jab3 = 4,
    RapidJabs = 5,
    DashAttack = 6,
    Ftilt = 7,
    Utilt = 8,
    Dtilt = 9,
    Fsmash = 10,
    Usmash = 11,
    Dsmash = 12,
    Nair = 13,
    Fair = 14,
    Bair = 15,
    Uair = 16,
    Dair = 17,
    NeutralB = 18,
    SideB = 19,
    UpB = 20,
    DownB = 21,
    GetupAttack = 50,
    GetupAttackSlow = 51,
    Pummel = 52,
    Fthrow = 53,
    Bthrow = 54,
    Uthrow = 55,
    Dthrow = 56,
    EdgeAttackSlow = 61,
    EdgeAttackQuick = 62,
}

/// Resolves a raw attack id to its name, passing unknown ids through.
pub fn attack_name(id: u8) -> String {
    match Attack::try_from(id) {
        Ok(attack) => attack.to_string(),
        Err(_) => id.to_string(),
    }
}
