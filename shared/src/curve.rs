//! Authored curves: the ball's speed decay curve and its glow gradient.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurveKey {
    pub time: f64,
    pub value: f64,
}

/// Piecewise curve sampled on `[0, 1]`.
///
/// Between keys the curve is either linear or eased with a smoothstep, which is
/// close enough to the flat-tangent keys the game was tuned with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Curve {
    pub keys: Vec<CurveKey>,
    #[serde(default)]
    pub smooth: bool,
}

impl Curve {
    /// Straight line from `start` at t=0 to `end` at t=1.
    pub fn linear(start: f64, end: f64) -> Self {
        Self {
            keys: vec![
                CurveKey {
                    time: 0.0,
                    value: start,
                },
                CurveKey {
                    time: 1.0,
                    value: end,
                },
            ],
            smooth: false,
        }
    }

    /// Sample the curve. Outside the keyed range the end values are held.
    pub fn evaluate(&self, t: f64) -> f64 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                let mut u = (t - a.time) / span;
                if self.smooth {
                    u = u * u * (3.0 - 2.0 * u);
                }
                return a.value + (b.value - a.value) * u;
            }
        }
        last.value
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.keys.is_empty() {
            return Err("curve needs at least one key");
        }
        if self
            .keys
            .iter()
            .any(|k| !k.time.is_finite() || !k.value.is_finite())
        {
            return Err("curve keys must be finite");
        }
        if self.keys.windows(2).any(|w| w[1].time < w[0].time) {
            return Err("curve keys must be sorted by time");
        }
        Ok(())
    }
}

impl Default for Curve {
    /// Full boost at the start of the timer, none at the end.
    fn default() -> Self {
        Self::linear(1.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorKey {
    pub time: f64,
    /// Packed 0xRRGGBB
    pub color: u32,
}

/// Colour gradient over `[0, 1]`, interpolated per channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gradient {
    pub keys: Vec<ColorKey>,
}

impl Gradient {
    pub fn evaluate(&self, t: f64) -> u32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0,
        };
        if t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.color;
                }
                return lerp_color(a.color, b.color, (t - a.time) / span);
            }
        }
        last.color
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.keys.is_empty() {
            return Err("gradient needs at least one key");
        }
        if self.keys.iter().any(|k| !k.time.is_finite() || k.color > 0xFFFFFF) {
            return Err("gradient keys must have finite times and 24-bit colours");
        }
        if self.keys.windows(2).any(|w| w[1].time < w[0].time) {
            return Err("gradient keys must be sorted by time");
        }
        Ok(())
    }
}

impl Default for Gradient {
    /// Cool white at base speed, through orange, to hot magenta at the cap.
    fn default() -> Self {
        Self {
            keys: vec![
                ColorKey {
                    time: 0.0,
                    color: 0xd8f0ff,
                },
                ColorKey {
                    time: 0.5,
                    color: 0xff8c1a,
                },
                ColorKey {
                    time: 1.0,
                    color: 0xff1aa3,
                },
            ],
        }
    }
}

fn lerp_color(a: u32, b: u32, t: f64) -> u32 {
    let channel = |shift: u32| {
        let ca = ((a >> shift) & 0xff) as f64;
        let cb = ((b >> shift) & 0xff) as f64;
        ((ca + (cb - ca) * t).round() as u32).min(0xff)
    };
    (channel(16) << 16) | (channel(8) << 8) | channel(0)
}
