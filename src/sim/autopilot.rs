//! Idle/demo autopilot
//!
//! Climbs the main chain by looking ahead: a copy of the body is stepped
//! forward under each steering choice to find where it would come down
//! through the target platform's top. It jumps once those touchdowns bracket
//! the target, re-plans its drift every airborne frame and lets go of the
//! controls on the frame it lands so the edge guard holds it.

use serde::{Deserialize, Serialize};

use super::body::{FallState, Handling, PlayerBody, SteerState};
use super::collision::{crossing_x, would_land};
use super::geometry::Span;
use super::level::{Level, Platform, PlatformKind};
use super::session::TickInput;

/// Steering choices tried by the look-ahead
const STEER_CHOICES: [SteerState; 3] = [SteerState::Neither, SteerState::Left, SteerState::Right];

/// Look-ahead horizon, in full jump airtimes
const HORIZON_JUMPS: u32 = 3;

/// Where a predicted flight comes down through a platform's top
#[derive(Debug, Clone, Copy, PartialEq)]
struct Touchdown {
    x: f32,
    /// Horizontal speed at the crossing
    speed: f32,
}

/// Touchdowns per entry of `STEER_CHOICES`
type Forecast = [Option<Touchdown>; 3];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autopilot {
    /// Platform currently being aimed for
    target: Option<usize>,
}

impl Autopilot {
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Next main-chain platform to aim for from the platform at `from`.
    /// A red herring leads back to the chain platform it hangs beside.
    fn next_target(level: &Level, from: usize) -> Option<usize> {
        let platforms = level.platforms();
        let from_y = platforms[from].pos.y;
        let chain = level.main_chain().iter().copied();

        if platforms[from].kind == PlatformKind::RedHerring {
            if let Some(beside) = chain.clone().find(|&i| platforms[i].pos.y == from_y) {
                return Some(beside);
            }
        }
        chain
            .filter(|&i| platforms[i].pos.y < from_y)
            .max_by(|&a, &b| platforms[a].pos.y.total_cmp(&platforms[b].pos.y))
    }

    /// Input for the coming frame under the handling and bounds it will be
    /// integrated with
    pub fn input(
        &mut self,
        body: &PlayerBody,
        level: &Level,
        handling: &Handling,
        bounds: Span,
    ) -> TickInput {
        if let Some(surface) = body.surface() {
            self.target = Self::next_target(level, surface);
        }
        let Some(target) = self.target else {
            return TickInput::default();
        };

        let platform = &level.platforms()[target];
        let toward = if platform.center_x() > body.pos().x {
            SteerState::Right
        } else {
            SteerState::Left
        };

        let (steer, jump) = match body.fall_state() {
            FallState::OnSurface | FallState::CoyoteTime => {
                let forecast = forecast(body, true, platform, handling, bounds);
                if brackets(&forecast, landing_zone(platform, body.radius())) {
                    (correction(&forecast, platform, body.radius(), toward), true)
                } else if moving_away(body, toward) && handling.friction >= handling.thrust {
                    // Letting go stops sooner than pushing back
                    (SteerState::Neither, false)
                } else {
                    (toward, false)
                }
            }
            _ if touches_down(body, level, handling, bounds) => (SteerState::Neither, false),
            _ => {
                let forecast = forecast(body, false, platform, handling, bounds);
                (correction(&forecast, platform, body.radius(), toward), false)
            }
        };

        TickInput {
            steer: Some(steer),
            jump,
            drop: false,
            idle_mode: true,
        }
    }
}

fn moving_away(body: &PlayerBody, toward: SteerState) -> bool {
    toward
        .sign()
        .is_some_and(|sign| body.vel().x * sign < 0.0)
}

/// The part of a platform worth aiming a touchdown at
fn landing_zone(platform: &Platform, radius: f32) -> Span {
    let margin = radius.min(platform.width / 4.0);
    Span::new(platform.pos.x + margin, platform.right() - margin)
}

/// Where a copy of `body` holding `steer` (after an optional jump) first
/// comes down through `platform`'s top, if it does within the horizon
fn touchdown(
    body: &PlayerBody,
    jump: bool,
    steer: SteerState,
    platform: &Platform,
    handling: &Handling,
    bounds: Span,
) -> Option<Touchdown> {
    let mut ghost = body.clone();
    ghost.steer(steer);
    if jump {
        ghost.jump();
    }
    let top = platform.pos.y;
    let r = ghost.radius();
    let horizon = HORIZON_JUMPS * ghost.envelope().jump_frames();

    for _ in 0..horizon {
        ghost.integrate(handling, bounds);
        let (prev, pos) = (ghost.prev_pos, ghost.pos);
        if ghost.fall_state == FallState::OnSurface {
            return None;
        }
        if !(ghost.fall_state.can_land() && pos.y > prev.y) {
            continue;
        }
        if top < prev.y {
            // Already below the top on the way down
            return None;
        }
        if top <= pos.y + r {
            return Some(Touchdown {
                x: crossing_x(prev, pos, r, top),
                speed: ghost.vel.x.abs(),
            });
        }
    }
    None
}

fn forecast(
    body: &PlayerBody,
    jump: bool,
    platform: &Platform,
    handling: &Handling,
    bounds: Span,
) -> Forecast {
    STEER_CHOICES.map(|steer| touchdown(body, jump, steer, platform, handling, bounds))
}

/// Whether the touchdowns fall on both sides of (or inside) `zone`, so some
/// mix of steering in the air can land in it
fn brackets(forecast: &Forecast, zone: Span) -> bool {
    let xs = forecast.iter().flatten().map(|t| t.x);
    let lowest = xs.clone().fold(f32::INFINITY, f32::min);
    let highest = xs.fold(f32::NEG_INFINITY, f32::max);
    lowest <= zone.max && highest >= zone.min
}

/// Steering for the coming frame: the slowest touchdown inside the landing
/// zone, otherwise the one nearest the platform centre (ties keep the
/// earlier choice, so letting go wins)
fn correction(
    forecast: &Forecast,
    platform: &Platform,
    radius: f32,
    toward: SteerState,
) -> SteerState {
    let zone = landing_zone(platform, radius);
    let centre = platform.center_x();
    let choices = || {
        STEER_CHOICES
            .iter()
            .zip(forecast)
            .filter_map(|(&steer, t)| t.map(|t| (steer, t)))
    };

    if let Some((steer, _)) = choices()
        .filter(|(_, t)| zone.contains(t.x))
        .min_by(|(_, a), (_, b)| {
            a.speed
                .total_cmp(&b.speed)
                .then((a.x - centre).abs().total_cmp(&(b.x - centre).abs()))
        })
    {
        return steer;
    }
    choices()
        .min_by(|(_, a), (_, b)| (a.x - centre).abs().total_cmp(&(b.x - centre).abs()))
        .map_or(toward, |(steer, _)| steer)
}

/// Whether letting go now would land the body on some platform this frame
fn touches_down(body: &PlayerBody, level: &Level, handling: &Handling, bounds: Span) -> bool {
    let mut ghost = body.clone();
    ghost.steer(SteerState::Neither);
    ghost.integrate(handling, bounds);
    would_land(&ghost, level)
}
