//! Long-range armor detector for the outpost.

use armor_vision_core::{
    label, Armor, Color, DrawPrimitive, FrameView, LightBar, Model, StageTimer, Team,
};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::light::{extract_light_bars, LightParams};
use crate::pairing::{find_armors, PairingParams};
use crate::render::{armor_primitives, Canvas};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnipeParams {
    pub light: LightParams,
    pub pairing: PairingParams,
}

/// Finds enemy light bars, pairs them and tags every plate as the outpost.
#[derive(Debug)]
pub struct SnipeDetector {
    params: SnipeParams,
    enemy_team: Team,
    light_bars: Vec<LightBar>,
    targets: Vec<Armor>,
    timer: StageTimer,
}

impl SnipeDetector {
    pub fn new(params: SnipeParams, enemy_team: Team) -> Self {
        debug!("snipe detector for enemy {enemy_team}");
        Self {
            params,
            enemy_team,
            light_bars: Vec::new(),
            targets: Vec::new(),
            timer: StageTimer::new(),
        }
    }

    pub fn params(&self) -> &SnipeParams {
        &self.params
    }

    pub fn reset_params(&mut self, params: SnipeParams) {
        self.params = params;
        debug!("snipe parameters reset");
    }

    pub fn enemy_team(&self) -> Team {
        self.enemy_team
    }

    pub fn set_enemy_team(&mut self, enemy_team: Team) {
        self.enemy_team = enemy_team;
        debug!("enemy team set to {enemy_team}");
    }

    /// Light bars that fed the last detection.
    pub fn light_bars(&self) -> &[LightBar] {
        &self.light_bars
    }

    fn find_armors(&mut self, frame: &FrameView) {
        self.light_bars = extract_light_bars(frame, self.enemy_team, &self.params.light);
        self.targets = find_armors(&self.light_bars, &self.params.pairing);
        for armor in &mut self.targets {
            if let Err(err) = armor.set_model(Model::Outpost) {
                warn!("{err}");
            }
        }
    }
}

impl Detector for SnipeDetector {
    type Target = Armor;

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn detect(&mut self, frame: &FrameView<'_>) -> &[Armor] {
        self.targets.clear();
        self.light_bars.clear();
        self.timer.start();
        if frame.is_valid() {
            self.find_armors(frame);
            if self.targets.is_empty() {
                debug!("no armor among {} light bars", self.light_bars.len());
            }
        } else {
            error!("invalid frame {}x{}", frame.width, frame.height);
        }
        self.timer.stop("find armors");
        &self.targets
    }

    fn targets(&self) -> &[Armor] {
        &self.targets
    }

    fn visualize_result(&self, canvas: &mut Canvas<'_>, verbose: u8) {
        if verbose == 0 {
            return;
        }
        let mut prims = Vec::new();
        if verbose > 1 {
            prims.push(label(format!(
                "Found {} armors in {} ms",
                self.targets.len(),
                self.timer.last_ms()
            )));
        }
        if verbose > 2 {
            prims.extend(self.light_bars.iter().map(|bar| DrawPrimitive::Polygon {
                points: bar.image_vertices().to_vec(),
                color: Color::YELLOW,
            }));
        }
        prims.extend(armor_primitives(&self.targets, verbose > 2));
        canvas.draw_all(&prims);
    }
}
