use log::warn;
use serde::{Deserialize, Serialize};

use crate::detection::RawDetection;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Values in front of the class scores: x, y, w, h, objectness.
const BOX_FIELDS: usize = 5;

/// Declared layout of a detector output: `num_anchors` rows of
/// `[x, y, w, h, objectness, class_0 .. class_{C-1}]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    pub num_anchors: usize,
    pub row_len: usize,
}

impl TensorShape {
    pub fn new(num_anchors: usize, num_classes: usize) -> Self {
        Self {
            num_anchors,
            row_len: BOX_FIELDS + num_classes,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.row_len.saturating_sub(BOX_FIELDS)
    }

    /// Total number of values the buffer should hold.
    pub fn volume(&self) -> usize {
        self.num_anchors * self.row_len
    }

    /// At least one class column and one anchor.
    pub fn is_decodable(&self) -> bool {
        self.num_anchors > 0 && self.num_classes() > 0
    }
}

/// Decode every anchor whose objectness exceeds `conf_threshold`.
///
/// Output follows anchor order. Confidence is not thresholded again; a
/// buffer shorter than the declared shape decodes its complete rows only.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(buffer), fields(anchors = shape.num_anchors))
)]
pub fn decode(buffer: &[f32], shape: TensorShape, conf_threshold: f32) -> Vec<RawDetection> {
    if !shape.is_decodable() {
        warn!(
            "cannot decode tensor with row length {} ({} anchors)",
            shape.row_len, shape.num_anchors
        );
        return Vec::new();
    }
    if buffer.len() != shape.volume() {
        warn!(
            "output buffer holds {} values, shape declares {}",
            buffer.len(),
            shape.volume()
        );
    }

    let mut out = Vec::new();
    for row in buffer.chunks_exact(shape.row_len).take(shape.num_anchors) {
        let objectness = row[4];
        if !(objectness > conf_threshold) {
            continue;
        }
        let Some((class_id, best)) = arg_max(&row[BOX_FIELDS..]) else {
            continue;
        };
        out.push(RawDetection {
            x_center: row[0],
            y_center: row[1],
            width: row[2],
            height: row[3],
            confidence: objectness * best,
            class_id,
        });
    }
    out
}

/// First index of the maximum; NaN scores never win.
fn arg_max(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if !(s > b) => {}
            _ if s.is_nan() => {}
            _ => best = Some((i, s)),
        }
    }
    best
}
