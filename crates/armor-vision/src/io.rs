//! JSON parameter documents for the detectors.
//!
//! The detector crates only take parsed structs; reading and writing the
//! documents happens here.

use std::fmt;
use std::fs;
use std::path::Path;

use armor_vision_core::Team;
use armor_vision_detect::{BlobParams, BuffParams, OreCubeParams, SnipeParams};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ParamsIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Detector selected by a parameter document.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    GuidingLight,
    Snipe,
    Buff,
    OreCube,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DetectorKind::GuidingLight => "guiding_light",
            DetectorKind::Snipe => "snipe",
            DetectorKind::Buff => "buff",
            DetectorKind::OreCube => "ore_cube",
        };
        f.write_str(s)
    }
}

/// Parameters of one detector, tagged with its kind.
///
/// ```json
/// { "kind": "snipe", "params": { "light": { ... }, "pairing": { ... } } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum DetectorParams {
    GuidingLight(BlobParams),
    Snipe(SnipeParams),
    Buff(BuffParams),
    OreCube(OreCubeParams),
}

impl DetectorParams {
    pub fn kind(&self) -> DetectorKind {
        match self {
            DetectorParams::GuidingLight(_) => DetectorKind::GuidingLight,
            DetectorParams::Snipe(_) => DetectorKind::Snipe,
            DetectorParams::Buff(_) => DetectorKind::Buff,
            DetectorParams::OreCube(_) => DetectorKind::OreCube,
        }
    }
}

/// A complete detection setup: which detector, its parameters and the team
/// it looks for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Team whose lights are searched (enemy for snipe, own for buff).
    /// Ignored by the colour-blind detectors.
    #[serde(default)]
    pub team: Team,
    pub detector: DetectorParams,
}

impl DetectConfig {
    /// Default document for `kind`.
    pub fn default_for(kind: DetectorKind) -> Self {
        let detector = match kind {
            DetectorKind::GuidingLight => DetectorParams::GuidingLight(BlobParams::default()),
            DetectorKind::Snipe => DetectorParams::Snipe(SnipeParams::default()),
            DetectorKind::Buff => DetectorParams::Buff(BuffParams::default()),
            DetectorKind::OreCube => DetectorParams::OreCube(OreCubeParams::default()),
        };
        let team = match kind {
            DetectorKind::Snipe | DetectorKind::Buff => Team::Red,
            DetectorKind::GuidingLight | DetectorKind::OreCube => Team::Dead,
        };
        Self { team, detector }
    }

    pub fn kind(&self) -> DetectorKind {
        self.detector.kind()
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ParamsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ParamsIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
