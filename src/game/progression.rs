//! Gun-game weapon tier progression

use serde::{Deserialize, Serialize};

/// Weapon tier held by a player. Tiers only ever move upward within a
/// match and freeze at [`Tier::KNIFE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(u8);

/// Outcome of crediting a kill to a player's tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Moved up to the contained tier
    Advanced(Tier),
    /// Kill scored on the terminal tier: the match is won
    Victory,
}

impl Tier {
    pub const PISTOL: Tier = Tier(0);
    pub const SHOTGUN: Tier = Tier(1);
    pub const MACHINE_GUN: Tier = Tier(2);
    pub const SNIPER: Tier = Tier(3);
    pub const KNIFE: Tier = Tier(4);

    /// Number of tiers in the progression
    #[cfg(test)]
    pub const COUNT: usize = 5;

    #[cfg(test)]
    pub fn from_index(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Tier(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_terminal(self) -> bool {
        self == Self::KNIFE
    }

    /// Credit a kill. On the terminal tier this is the victory signal and
    /// the tier does not change.
    pub fn promote(self) -> Promotion {
        if self.is_terminal() {
            Promotion::Victory
        } else {
            Promotion::Advanced(Tier(self.0 + 1))
        }
    }

    /// Weapon name reported in kill events
    pub fn name(self) -> &'static str {
        match self {
            Self::PISTOL => "pistol",
            Self::SHOTGUN => "shotgun",
            Self::MACHINE_GUN => "machinegun",
            Self::SNIPER => "sniper",
            _ => "knife",
        }
    }
}
