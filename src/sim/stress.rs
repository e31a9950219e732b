//! Stress model
//!
//! A bounded scalar driven by the distance between the player and the wave.
//! Above the effect threshold it shifts player handling from calm to
//! stressed and drives the visual parameters a renderer would read.

use serde::{Deserialize, Serialize};

use super::body::{Handling, HandlingRange};
use crate::lerp;
use crate::settings::Viewport;
use crate::tuning::{ABS_MAX_STRESS, Debuff, StressTuning};

/// Renderer-facing outputs of the stress level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visuals {
    /// Hue (degrees), saturation, brightness
    pub hsb: [f32; 3],
    pub frames_per_resketch: u32,
    pub stress_bar_visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressModel {
    tuning: StressTuning,
    range: HandlingRange,
    debuff: Debuff,
    incr_range: f32,
    decr_range: f32,
    /// Beyond this distance the wave is out of sight (tunnel vision)
    sight_distance: f32,
    stress: f32,
    old_stress: f32,
    handling: Handling,
    visuals: Visuals,
}

impl StressModel {
    pub fn new(
        tuning: &StressTuning,
        range: HandlingRange,
        viewport: &Viewport,
        debuff: Debuff,
    ) -> Self {
        let mut model = Self {
            tuning: *tuning,
            range,
            debuff,
            incr_range: viewport.height / tuning.incr_range_div,
            decr_range: viewport.height / tuning.decr_range_div,
            sight_distance: viewport.height / tuning.tunnel_vision_div,
            stress: tuning.min_stress,
            old_stress: tuning.min_stress,
            handling: range.calm,
            visuals: Visuals {
                hsb: [0.0; 3],
                frames_per_resketch: 0,
                stress_bar_visible: true,
            },
        };
        model.recompute();
        model
    }

    pub fn stress(&self) -> f32 {
        self.stress
    }

    /// Stress before the most recent update
    pub fn old_stress(&self) -> f32 {
        self.old_stress
    }

    pub fn handling(&self) -> &Handling {
        &self.handling
    }

    pub fn visuals(&self) -> &Visuals {
        &self.visuals
    }

    pub fn debuff(&self) -> Debuff {
        self.debuff
    }

    /// Interpolation factor from calm (0) to stressed (1).
    /// Stress-motivated players extrapolate below the threshold.
    pub fn effect(&self) -> f32 {
        let threshold = self.tuning.effect_threshold;
        if self.debuff == Debuff::StressMotivated || self.stress >= threshold {
            (self.stress - threshold) / (ABS_MAX_STRESS - threshold)
        } else {
            0.0
        }
    }

    /// Advance one frame given the vertical distance to the wave
    pub fn update(&mut self, distance: f32, frame: u64) {
        self.old_stress = self.stress;
        let t = &self.tuning;

        if distance.is_finite() {
            if distance > self.incr_range {
                if self.debuff != Debuff::CantUnwind {
                    self.stress -= t.decr_rate * (distance - self.incr_range) / self.decr_range;
                }
            } else if !(self.debuff == Debuff::TunnelVision && distance > self.sight_distance) {
                self.stress += t.incr_rate * (self.incr_range - distance) / self.incr_range;
            }
        }

        if self.debuff == Debuff::PanicProne
            && t.panic_interval > 0
            && frame > 0
            && frame % t.panic_interval == 0
        {
            log::debug!("Panic spike at frame {frame}");
            self.stress += t.panic_spike;
        }

        self.stress = self.stress.clamp(t.min_stress, t.max_stress);
        self.recompute();
    }

    fn recompute(&mut self) {
        let e = self.effect();
        let (calm, stressed) = (self.range.calm, self.range.stressed);
        self.handling = Handling {
            thrust: lerp(calm.thrust, stressed.thrust, e),
            friction: lerp(calm.friction, stressed.friction, e),
            min_speed: lerp(calm.min_speed, stressed.min_speed, e),
        };

        let visual_e = if self.debuff == Debuff::LackContrast {
            0.0
        } else {
            e
        };
        let t = &self.tuning;
        self.visuals = Visuals {
            hsb: [
                lerp(t.hue.0, t.hue.1, visual_e),
                lerp(t.saturation.0, t.saturation.1, visual_e),
                lerp(t.brightness.0, t.brightness.1, visual_e),
            ],
            frames_per_resketch: lerp(t.frames_per_resketch.0, t.frames_per_resketch.1, visual_e)
                .max(1.0) as u32,
            stress_bar_visible: self.debuff != Debuff::LackContrast,
        };
    }
}
