//! Player body kinematics
//!
//! Discrete per-frame integration with a small fall-state machine: jump
//! buffering, coyote time, hang time at the apex and drop-through. All
//! quantities are in pixels and frames.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Span, solve_quadratic};
use crate::consts::PC_DIAMETER_DIV;
use crate::error::SimError;
use crate::settings::Viewport;
use crate::tuning::BodyTuning;

/// Slack when rounding continuous timings to whole frames
const FRAME_EPSILON: f32 = 1e-3;

/// Vertical movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallState {
    /// Standing on a platform
    OnSurface,
    /// Moving upward after a jump
    Rising,
    /// Held at the apex of a jump
    HangTime,
    Falling,
    /// Just walked off an edge; a jump is still allowed
    CoyoteTime,
    /// Passing down through the platform that was stood on
    Dropping,
}

impl FallState {
    /// States in which the collision resolver looks for a landing
    #[inline]
    pub fn can_land(self) -> bool {
        matches!(
            self,
            FallState::Falling | FallState::CoyoteTime | FallState::Dropping
        )
    }

    /// Whether `next` may be observed one frame after `self`
    pub fn can_follow(self, next: FallState) -> bool {
        use FallState::*;
        self == next
            || matches!(
                (self, next),
                (OnSurface, Rising | CoyoteTime | Falling | Dropping)
                    | (Rising, HangTime)
                    | (HangTime, Falling)
                    | (Falling, OnSurface)
                    | (CoyoteTime, Rising | Falling | OnSurface)
                    | (Dropping, OnSurface)
            )
    }
}

/// Horizontal input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SteerState {
    Left,
    Right,
    #[default]
    Neither,
}

impl SteerState {
    #[inline]
    pub(crate) fn sign(self) -> Option<f32> {
        match self {
            SteerState::Left => Some(-1.0),
            SteerState::Right => Some(1.0),
            SteerState::Neither => None,
        }
    }
}

/// Horizontal movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveState {
    #[default]
    AtRest,
    Accelerating,
    Decelerating,
    MaxSpeed,
}

/// Horizontal forces as accelerations (px/frame²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handling {
    pub thrust: f32,
    pub friction: f32,
    /// Below this speed an unsteered body snaps to rest
    pub min_speed: f32,
}

/// Handling at zero and full stress effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandlingRange {
    pub calm: Handling,
    pub stressed: Handling,
}

/// Analytic jump reach; the contract the level generator builds against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpEnvelope {
    /// Peak rise of a standing jump (px)
    pub jump_height: f32,
    /// Horizontal distance of a max-speed jump landing at take-off height (px)
    pub jump_range: f32,
    pub rise_frames: u32,
    pub hang_frames: u32,
    /// Frames to fall `jump_height` from rest
    pub fall_frames: u32,
    rise_time: f32,
    fall_gravity: f32,
    max_speed: f32,
}

impl JumpEnvelope {
    /// Frames from take-off to apex
    #[inline]
    pub fn jump_frames(&self) -> u32 {
        self.rise_frames + self.hang_frames + self.fall_frames
    }

    /// Horizontal reach when landing `rise` px above take-off (negative = below).
    /// Zero when the rise is out of reach.
    pub fn reach_at_rise(&self, rise: f32) -> f32 {
        if rise > self.jump_height {
            return 0.0;
        }
        let drop = self.jump_height - rise;
        let fall_time = solve_quadratic(0.5 * self.fall_gravity as f64, 0.0, -(drop as f64))
            .unwrap_or(0.0) as f32;
        self.max_speed * (self.rise_time + self.hang_frames as f32 + fall_time)
    }
}

/// Derived physics constants for a viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    pub diameter: f32,
    /// px/frame
    pub max_speed: f32,
    pub jump_speed: f32,
    /// px/frame²
    pub rise_gravity: f32,
    pub fall_gravity: f32,
    pub air_multiplier: f32,
    pub restitution: f32,
    pub hang_frames: u32,
    pub bounce_remember: u32,
    pub coyote_frames: u32,
    pub handling: HandlingRange,
    pub envelope: JumpEnvelope,
}

impl BodyParams {
    /// Derive pixel-space constants and the jump envelope.
    ///
    /// Fails on any configuration that would put NaN or infinity into the
    /// simulation, including a fall time with no real solution.
    pub fn derive(tuning: &BodyTuning, viewport: &Viewport) -> Result<Self, SimError> {
        let positive = [
            (tuning.inverse_mass, "inverse_mass must be positive"),
            (tuning.jump_impulse, "jump_impulse must be positive"),
            (tuning.rise_gravity, "rise_gravity must be positive"),
            (tuning.fall_gravity, "fall_gravity must be positive"),
            (tuning.max_speed, "max_speed must be positive"),
            (tuning.calm_acc_frames, "calm_acc_frames must be positive"),
            (tuning.stressed_acc_frames, "stressed_acc_frames must be positive"),
            (tuning.calm_dec_frames, "calm_dec_frames must be positive"),
            (tuning.stressed_dec_frames, "stressed_dec_frames must be positive"),
            (tuning.air_multiplier, "air_multiplier must be positive"),
        ];
        for (value, what) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::DegeneratePhysics(what));
            }
        }
        if !(tuning.restitution >= 0.0 && tuning.restitution < 1.0) {
            return Err(SimError::DegeneratePhysics("restitution must be in [0, 1)"));
        }
        if !(viewport.width > 0.0 && viewport.width.is_finite()) {
            return Err(SimError::DegeneratePhysics("viewport width must be positive"));
        }

        let unit = viewport.unit();
        let jump_speed = tuning.jump_impulse * tuning.inverse_mass * unit;
        let rise_gravity = tuning.rise_gravity * tuning.inverse_mass * unit;
        let fall_gravity = tuning.fall_gravity * tuning.inverse_mass * unit;
        let max_speed = tuning.max_speed * unit;

        // v = u + at  →  apex when 0 = u - g·t
        let rise_time = jump_speed / rise_gravity;
        // s = ut + ½at²
        let jump_height = jump_speed * rise_time - 0.5 * rise_gravity * rise_time * rise_time;
        // ½g·t² - h = 0
        let fall_time = solve_quadratic(0.5 * fall_gravity as f64, 0.0, -(jump_height as f64))
            .filter(|t| *t >= 0.0)
            .ok_or(SimError::DegeneratePhysics("fall time has no real solution"))?
            as f32;
        let airtime = rise_time + tuning.hang_frames as f32 + fall_time;
        let jump_range = max_speed * airtime;

        if !(jump_height.is_finite() && jump_height > 0.0 && jump_range.is_finite()) {
            return Err(SimError::DegeneratePhysics("jump envelope is not finite"));
        }

        // Accelerate/decelerate across max speed in the given frames
        let accel = |frames: f32| 2.0 * max_speed / (frames * frames);
        let calm_friction = accel(tuning.calm_dec_frames);
        let stressed_friction = accel(tuning.stressed_dec_frames);
        let handling = HandlingRange {
            calm: Handling {
                thrust: accel(tuning.calm_acc_frames),
                friction: calm_friction,
                min_speed: calm_friction,
            },
            stressed: Handling {
                thrust: accel(tuning.stressed_acc_frames),
                friction: stressed_friction,
                min_speed: stressed_friction,
            },
        };

        let envelope = JumpEnvelope {
            jump_height,
            jump_range,
            rise_frames: (rise_time - FRAME_EPSILON).ceil().max(1.0) as u32,
            hang_frames: tuning.hang_frames,
            fall_frames: (fall_time - FRAME_EPSILON).ceil().max(1.0) as u32,
            rise_time,
            fall_gravity,
            max_speed,
        };

        Ok(Self {
            diameter: viewport.width / PC_DIAMETER_DIV,
            max_speed,
            jump_speed,
            rise_gravity,
            fall_gravity,
            air_multiplier: tuning.air_multiplier,
            restitution: tuning.restitution,
            hang_frames: tuning.hang_frames,
            bounce_remember: tuning.bounce_remember,
            coyote_frames: tuning.coyote_frames,
            handling,
            envelope,
        })
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.diameter / 2.0
    }
}

/// The player-controlled body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBody {
    pub(crate) params: BodyParams,
    pub(crate) pos: Vec2,
    pub(crate) prev_pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) fall_state: FallState,
    pub(crate) steer_state: SteerState,
    pub(crate) move_state: MoveState,
    /// Index of the supporting platform
    pub(crate) surface: Option<usize>,
    /// Platform being dropped through
    pub(crate) dropping_through: Option<usize>,
    pub(crate) jump_memory: u32,
    pub(crate) coyote_counter: u32,
    pub(crate) hang_counter: u32,
    /// Steered since the last landing (edge guard)
    pub(crate) steer_since_land: bool,
    jump_requested: bool,
    drop_requested: bool,
    /// Integrations performed
    pub(crate) steps: u64,
}

impl PlayerBody {
    /// A body in free fall at `pos`
    pub fn new(params: BodyParams, pos: Vec2) -> Self {
        Self {
            params,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            fall_state: FallState::Falling,
            steer_state: SteerState::Neither,
            move_state: MoveState::AtRest,
            surface: None,
            dropping_through: None,
            jump_memory: 0,
            coyote_counter: 0,
            hang_counter: 0,
            steer_since_land: false,
            jump_requested: false,
            drop_requested: false,
            steps: 0,
        }
    }

    /// A body standing on platform `platform` whose top is at `top`
    pub fn standing(params: BodyParams, x: f32, platform: usize, top: f32) -> Self {
        let mut body = Self::new(params, Vec2::new(x, top - params.radius()));
        body.land(platform, top);
        body.prev_pos = body.pos;
        body
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn prev_pos(&self) -> Vec2 {
        self.prev_pos
    }

    pub fn vel(&self) -> Vec2 {
        self.vel
    }

    pub fn diameter(&self) -> f32 {
        self.params.diameter
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.params.radius()
    }

    pub fn fall_state(&self) -> FallState {
        self.fall_state
    }

    pub fn steer_state(&self) -> SteerState {
        self.steer_state
    }

    pub fn move_state(&self) -> MoveState {
        self.move_state
    }

    pub fn surface(&self) -> Option<usize> {
        self.surface
    }

    pub fn params(&self) -> &BodyParams {
        &self.params
    }

    pub fn envelope(&self) -> &JumpEnvelope {
        &self.params.envelope
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn steer(&mut self, direction: SteerState) {
        self.steer_state = direction;
        if direction != SteerState::Neither {
            self.steer_since_land = true;
        }
    }

    /// Request a jump at the next integration
    pub fn jump(&mut self) {
        self.jump_requested = true;
    }

    /// Request dropping through the current platform at the next integration
    pub fn drop_through(&mut self) {
        self.drop_requested = true;
    }

    #[inline]
    fn can_jump(&self) -> bool {
        matches!(
            self.fall_state,
            FallState::OnSurface | FallState::CoyoteTime
        )
    }

    /// Advance one frame
    pub fn integrate(&mut self, handling: &Handling, bounds: Span) {
        self.prev_pos = self.pos;
        self.steps += 1;

        if std::mem::take(&mut self.drop_requested) && self.fall_state == FallState::OnSurface {
            self.dropping_through = self.surface.take();
            self.fall_state = FallState::Dropping;
        }

        if std::mem::take(&mut self.jump_requested) {
            if self.can_jump() {
                self.perform_jump();
            } else {
                self.jump_memory = self.params.bounce_remember;
            }
        } else if self.jump_memory > 0 {
            if self.fall_state == FallState::OnSurface {
                self.perform_jump();
            } else {
                self.jump_memory -= 1;
            }
        }

        self.update_horizontal(handling);
        self.update_vertical();

        self.pos += self.vel;
        self.apply_bounds(bounds);
    }

    fn perform_jump(&mut self) {
        self.vel.y = -self.params.jump_speed;
        self.fall_state = FallState::Rising;
        self.surface = None;
        self.jump_memory = 0;
        self.coyote_counter = 0;
    }

    fn update_horizontal(&mut self, handling: &Handling) {
        let scale = if self.fall_state == FallState::OnSurface {
            1.0
        } else {
            self.params.air_multiplier
        };
        let thrust = handling.thrust * scale;
        let friction = handling.friction * scale;
        let min_speed = handling.min_speed * scale;
        let max_speed = self.params.max_speed;

        match self.steer_state.sign() {
            Some(sign) => {
                if self.vel.x * sign < max_speed {
                    self.vel.x += sign * thrust;
                }
                if self.vel.x * sign >= max_speed {
                    self.vel.x = sign * max_speed;
                    self.move_state = MoveState::MaxSpeed;
                } else {
                    self.move_state = MoveState::Accelerating;
                }
            }
            None => {
                let speed = self.vel.x.abs();
                let slowed = speed - friction;
                if speed < min_speed || slowed < min_speed {
                    self.vel.x = 0.0;
                    self.move_state = MoveState::AtRest;
                } else {
                    self.vel.x = self.vel.x.signum() * slowed;
                    self.move_state = MoveState::Decelerating;
                }
            }
        }
    }

    fn update_vertical(&mut self) {
        self.vel.y += match self.fall_state {
            FallState::OnSurface | FallState::HangTime => 0.0,
            FallState::Rising => self.params.rise_gravity,
            FallState::Falling | FallState::CoyoteTime | FallState::Dropping => {
                self.params.fall_gravity
            }
        };

        match self.fall_state {
            FallState::Rising if self.vel.y >= 0.0 => {
                self.fall_state = FallState::HangTime;
                self.vel.y = 0.0;
                self.hang_counter = 0;
            }
            FallState::HangTime => {
                if self.hang_counter >= self.params.hang_frames {
                    self.fall_state = FallState::Falling;
                } else {
                    self.hang_counter += 1;
                }
            }
            FallState::CoyoteTime => {
                self.coyote_counter = self.coyote_counter.saturating_sub(1);
                if self.coyote_counter == 0 {
                    self.fall_state = FallState::Falling;
                }
            }
            _ => {}
        }
    }

    fn apply_bounds(&mut self, bounds: Span) {
        let r = self.radius();
        let restitution = self.params.restitution;
        if self.pos.x - r <= bounds.min {
            self.pos.x = bounds.min + r;
            self.vel.x = self.vel.x.abs() * restitution;
        } else if self.pos.x + r >= bounds.max {
            self.pos.x = bounds.max - r;
            self.vel.x = -self.vel.x.abs() * restitution;
        }
    }

    /// Come to rest on a platform whose top edge is at `top`
    pub(crate) fn land(&mut self, platform: usize, top: f32) {
        self.fall_state = FallState::OnSurface;
        self.surface = Some(platform);
        self.dropping_through = None;
        self.coyote_counter = 0;
        self.vel.y = 0.0;
        self.pos.y = top - self.radius();
        if self.steer_state == SteerState::Neither {
            self.steer_since_land = false;
        }
    }

    /// Leave the supporting platform over its edge
    pub(crate) fn walk_off(&mut self) {
        self.surface = None;
        if self.params.coyote_frames == 0 {
            self.fall_state = FallState::Falling;
        } else {
            self.fall_state = FallState::CoyoteTime;
            self.coyote_counter = self.params.coyote_frames;
        }
    }

    /// Whether leaving the surface should be refused (landed and never steered)
    pub(crate) fn edge_guarded(&self) -> bool {
        !self.steer_since_land
    }

    /// Stop at a platform edge instead of sliding off
    pub(crate) fn hold_at(&mut self, x: f32) {
        self.pos.x = x;
        self.vel.x = 0.0;
        self.move_state = MoveState::AtRest;
    }

    /// Shift vertically with the level pan; keeps the frame's sweep intact
    pub(crate) fn translate(&mut self, dy: f32) {
        self.pos.y += dy;
        self.prev_pos.y += dy;
    }
}
