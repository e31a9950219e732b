//! Data-driven game balance
//!
//! Difficulties and debuffs are plain records consumed by the generator and
//! the stress model. Physics and generation constants live in tuning structs
//! so a host can override them through [`crate::Settings`].

use serde::{Deserialize, Serialize};

/// Stress is always interpreted on a 0..=100 scale for effects
pub const ABS_MAX_STRESS: f32 = 100.0;

/// Level difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "veryhard" => Some(Difficulty::VeryHard),
            _ => None,
        }
    }

    /// The level parameters for this preset
    pub fn params(&self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                height_mult: 1.5,
                has_ground: true,
                verticality: 0.6,
                between_red_herrings: 3,
                wave_rise_time: 14.0,
            },
            Difficulty::Medium => DifficultyParams {
                height_mult: 2.0,
                has_ground: false,
                verticality: 0.4,
                between_red_herrings: 3,
                wave_rise_time: 12.0,
            },
            Difficulty::Hard => DifficultyParams {
                height_mult: 2.5,
                has_ground: false,
                verticality: 0.2,
                between_red_herrings: 3,
                wave_rise_time: 12.0,
            },
            Difficulty::VeryHard => DifficultyParams {
                height_mult: 3.0,
                has_ground: false,
                verticality: 0.1,
                between_red_herrings: 3,
                wave_rise_time: 12.0,
            },
        }
    }
}

/// Parameters that shape a generated level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Level height as a multiple of viewport height
    pub height_mult: f32,
    /// Start from a full-width ground platform
    pub has_ground: bool,
    /// Probability of a vertical hop (0-1)
    pub verticality: f32,
    /// Accepted hops between optional side platforms
    pub between_red_herrings: u32,
    /// Seconds for the wave to rise one viewport height
    pub wave_rise_time: f32,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Difficulty::default().params()
    }
}

/// Per-level handicaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Debuff {
    #[default]
    None,
    /// Every platform has a token
    Overworked,
    /// Stress spikes every few seconds
    PanicProne,
    /// Steering is sluggish when not stressed enough
    StressMotivated,
    /// Stress cannot reduce
    CantUnwind,
    /// The wave does not stress you while it is out of sight
    TunnelVision,
    /// Stress bar hidden, visuals not stress-dependent
    LackContrast,
}

impl Debuff {
    pub const ALL: [Debuff; 7] = [
        Debuff::None,
        Debuff::Overworked,
        Debuff::PanicProne,
        Debuff::StressMotivated,
        Debuff::CantUnwind,
        Debuff::TunnelVision,
        Debuff::LackContrast,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Debuff::None => "Feeling Typical",
            Debuff::Overworked => "Overworked",
            Debuff::PanicProne => "Panic Prone",
            Debuff::StressMotivated => "Stress Motivated",
            Debuff::CantUnwind => "Can't Unwind",
            Debuff::TunnelVision => "Tunnel Vision",
            Debuff::LackContrast => "Lacking Self-awareness",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Debuff::None => "No debuff",
            Debuff::Overworked => "Every platform has a token",
            Debuff::PanicProne => "Stress will spike every few seconds",
            Debuff::StressMotivated => "Steering is sluggish when you're not stressed enough",
            Debuff::CantUnwind => "Stress cannot reduce",
            Debuff::TunnelVision => {
                "Your vision is reduced, but you won't be stressed by the wave if you can't see it"
            }
            Debuff::LackContrast => {
                "The stress bar is hidden, and the drawing quality is not stress-dependent"
            }
        }
    }
}

/// Player physics constants in velocity units (one unit = viewport width / 100 px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyTuning {
    pub inverse_mass: f32,
    /// Upward impulse applied by a jump
    pub jump_impulse: f32,
    /// Gravity force while rising
    pub rise_gravity: f32,
    /// Gravity force while falling
    pub fall_gravity: f32,
    /// Maximum horizontal speed (units/frame)
    pub max_speed: f32,
    /// Frames to reach max speed when calm / stressed
    pub calm_acc_frames: f32,
    pub stressed_acc_frames: f32,
    /// Frames to stop from max speed when calm / stressed
    pub calm_dec_frames: f32,
    pub stressed_dec_frames: f32,
    /// Thrust and friction multiplier while airborne
    pub air_multiplier: f32,
    /// Coefficient of restitution against the level edges
    pub restitution: f32,
    pub hang_frames: u32,
    /// Frames a missed jump is remembered before landing
    pub bounce_remember: u32,
    /// Frames a jump is still allowed after walking off an edge
    pub coyote_frames: u32,
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            inverse_mass: 1.0 / 15.0,
            jump_impulse: 15.0,
            rise_gravity: 0.5,
            fall_gravity: 0.7,
            max_speed: 0.64,
            calm_acc_frames: 7.0,
            stressed_acc_frames: 4.0,
            calm_dec_frames: 5.0,
            stressed_dec_frames: 9.0,
            air_multiplier: 0.6,
            restitution: 0.75,
            hang_frames: 2,
            bounce_remember: 5,
            coyote_frames: 5,
        }
    }
}

/// Stress model constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressTuning {
    pub min_stress: f32,
    pub max_stress: f32,
    /// Stress below this has no effect (unless stress-motivated)
    pub effect_threshold: f32,
    pub incr_rate: f32,
    pub decr_rate: f32,
    /// Viewport height divisors for the rise/fall distance ranges
    pub incr_range_div: f32,
    pub decr_range_div: f32,
    /// Panic-prone spike period (frames) and size
    pub panic_interval: u64,
    pub panic_spike: f32,
    /// Tunnel-vision sight distance as a viewport height divisor
    pub tunnel_vision_div: f32,
    /// Calm → stressed colour endpoints (HSB)
    pub hue: (f32, f32),
    pub saturation: (f32, f32),
    pub brightness: (f32, f32),
    /// Calm → stressed re-sketch interval (frames)
    pub frames_per_resketch: (f32, f32),
}

impl Default for StressTuning {
    fn default() -> Self {
        Self {
            min_stress: 0.0,
            max_stress: ABS_MAX_STRESS,
            effect_threshold: 20.0,
            incr_rate: 0.75,
            decr_rate: 0.75,
            incr_range_div: 2.5,
            decr_range_div: 2.5,
            panic_interval: 240,
            panic_spike: 20.0,
            tunnel_vision_div: 4.0,
            hue: (280.0, 360.0),
            saturation: (0.2, 1.0),
            brightness: (0.9, 0.9),
            frames_per_resketch: (40.0, 10.0),
        }
    }
}

/// Level generation constants; ranges are (min, max) fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationTuning {
    /// Rise of a horizontal hop, fraction of jump height
    pub horizontal_rise: (f32, f32),
    /// Edge gap of a horizontal hop, fraction of safe reach
    pub horizontal_gap: (f32, f32),
    /// Rise of a vertical hop, fraction of jump height
    pub vertical_rise: (f32, f32),
    /// Max sideways shift of a vertical hop, fraction of platform width
    pub vertical_shift: f32,
    /// Edge gap of a reflection hop, fraction of safe reach
    pub reflection_gap: (f32, f32),
    /// Edge gap of a red herring, fraction of safe reach
    pub red_herring_gap: (f32, f32),
    /// Fraction of the analytic reach the generator relies on
    pub reach_safety: f32,
    /// Rejections before a vertical hop is forced
    pub max_stuck: u32,
    /// Hard cap on hop proposals
    pub max_hop_attempts: u32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            horizontal_rise: (0.3, 0.6),
            horizontal_gap: (0.15, 0.85),
            vertical_rise: (0.7, 0.9),
            vertical_shift: 0.5,
            reflection_gap: (0.1, 0.35),
            red_herring_gap: (0.2, 0.6),
            reach_safety: 0.8,
            max_stuck: 3,
            max_hop_attempts: 2_000,
        }
    }
}
