//! Time tiers: daily ⊂ weekly ⊂ monthly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three nested time tiers a loop can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
}

impl Tier {
    /// All tiers, smallest first
    pub const ALL: [Tier; 3] = [Tier::Daily, Tier::Weekly, Tier::Monthly];

    /// The tier a loop of this tier may link to.
    ///
    /// Monthly has no parent, which is what keeps the link graph acyclic.
    pub fn parent(self) -> Option<Tier> {
        match self {
            Tier::Daily => Some(Tier::Weekly),
            Tier::Weekly => Some(Tier::Monthly),
            Tier::Monthly => None,
        }
    }

    /// The tier whose loops may link to this one
    pub fn child(self) -> Option<Tier> {
        match self {
            Tier::Daily => None,
            Tier::Weekly => Some(Tier::Daily),
            Tier::Monthly => Some(Tier::Weekly),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Tier::Daily),
            "weekly" | "week" | "w" => Ok(Tier::Weekly),
            "monthly" | "month" | "m" => Ok(Tier::Monthly),
            other => Err(format!("unknown tier '{}' (expected daily, weekly or monthly)", other)),
        }
    }
}
