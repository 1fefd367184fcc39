use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Team colour of a robot or field element.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
    /// Lights off or colour unknown.
    #[default]
    Dead,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Team::Red => "red",
            Team::Blue => "blue",
            Team::Dead => "dead",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown team '{0}' (expected red, blue or dead)")]
pub struct ParseTeamError(pub String);

impl FromStr for Team {
    type Err = ParseTeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Team::Red),
            "blue" => Ok(Team::Blue),
            "dead" | "unknown" => Ok(Team::Dead),
            other => Err(ParseTeamError(other.to_string())),
        }
    }
}

/// Robot model carried by an armor plate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    #[default]
    Unknown,
    Hero,
    Engineer,
    Infantry3,
    Infantry4,
    Infantry5,
    Sentry,
    Outpost,
    Base,
    Drone,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Model::Unknown => "unknown",
            Model::Hero => "hero",
            Model::Engineer => "engineer",
            Model::Infantry3 => "infantry3",
            Model::Infantry4 => "infantry4",
            Model::Infantry5 => "infantry5",
            Model::Sentry => "sentry",
            Model::Outpost => "outpost",
            Model::Base => "base",
            Model::Drone => "drone",
        };
        f.write_str(s)
    }
}
