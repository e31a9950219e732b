//! Sweep collision resolution
//!
//! Reconciles one frame of discrete motion (`prev_pos → pos`) with the level.
//! Platforms and tokens are sorted by descending height once per level so
//! each scan can stop at the first entry above the sweep.

use glam::Vec2;

use super::body::{FallState, PlayerBody};
use super::geometry::{Aabb, CONTACT_EPSILON, Diamond};
use super::level::{Level, Platform};

/// What a resolution pass changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Platform landed on this frame
    pub landed: Option<usize>,
    /// Left the supporting platform over an edge
    pub walked_off: bool,
    /// Stopped at an edge instead of walking off
    pub held_at_edge: bool,
    /// Tokens collected this frame
    pub tokens: Vec<usize>,
}

impl Resolution {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Whether a circle of `radius` swept from `a` to `b` touches the diamond.
///
/// Boundary-inclusive: a sweep passing exactly `radius` away collides.
pub fn sweep_touches(diamond: &Diamond, a: Vec2, b: Vec2, radius: f32) -> bool {
    let reach = radius + CONTACT_EPSILON;
    let d = b - a;

    match (d.x == 0.0, d.y == 0.0) {
        // Stationary
        (true, true) => return diamond.distance_to_point(a) <= reach,
        // Horizontal: the sweep's row must cross the diamond's band
        (false, true) => {
            if (a.y - diamond.center.y).abs() > diamond.half_height + reach {
                return false;
            }
        }
        // Vertical: the sweep's column must cross the diamond's band
        (true, false) => {
            if (a.x - diamond.center.x).abs() > diamond.half_width + reach {
                return false;
            }
        }
        (false, false) => {}
    }

    if !Aabb::swept(a, b, reach).intersects(&diamond.bounds()) {
        return false;
    }
    diamond.distance_to_segment(a, b) <= reach
}

/// x of the lowest point of a body of `radius` as its step from `prev` to
/// `pos` crosses the height `top`
pub(crate) fn crossing_x(prev: Vec2, pos: Vec2, radius: f32, top: f32) -> f32 {
    let (prev_bottom, bottom) = (prev.y + radius, pos.y + radius);
    let t = ((top - prev_bottom) / (bottom - prev_bottom)).clamp(0.0, 1.0);
    prev.x + (pos.x - prev.x) * t
}

/// Whether a step that crosses the platform's top does so over the platform
fn meets_span(platform: &Platform, prev: Vec2, pos: Vec2, radius: f32) -> bool {
    let span = platform.span();
    span.contains(crossing_x(prev, pos, radius, platform.pos.y))
        || span.contains(prev.x)
        || span.contains(pos.x)
}

/// Whether the body's latest step would put it on some platform.
/// Unordered and side-effect free; the resolver decides which one.
pub(crate) fn would_land(body: &PlayerBody, level: &Level) -> bool {
    let (prev, pos, r) = (body.prev_pos, body.pos, body.radius());
    if !(body.fall_state.can_land() && pos.y > prev.y) {
        return false;
    }
    level.platforms().iter().enumerate().any(|(i, platform)| {
        let top = platform.pos.y;
        top >= prev.y
            && top <= pos.y + r
            && !(body.fall_state == FallState::Dropping && body.dropping_through == Some(i))
            && meets_span(platform, prev, pos, r)
    })
}

/// Height-sorted collision scans for one level
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    /// Platform indices, lowest on screen first
    platform_order: Vec<usize>,
    token_order: Vec<usize>,
    /// Body integration step last resolved
    last_step: Option<u64>,
}

impl CollisionResolver {
    pub fn new(level: &Level) -> Self {
        let platforms = level.platforms();
        let mut platform_order: Vec<usize> = (0..platforms.len()).collect();
        platform_order.sort_by(|&a, &b| platforms[b].pos.y.total_cmp(&platforms[a].pos.y));

        let tokens = level.tokens();
        let mut token_order: Vec<usize> = (0..tokens.len()).collect();
        token_order.sort_by(|&a, &b| tokens[b].anchor.y.total_cmp(&tokens[a].anchor.y));

        Self {
            platform_order,
            token_order,
            last_step: None,
        }
    }

    /// Resolve the body's latest integration step against the level.
    /// Repeated calls for the same step change nothing.
    pub fn resolve(&mut self, body: &mut PlayerBody, level: &mut Level) -> Resolution {
        if self.last_step == Some(body.steps) {
            return Resolution::none();
        }
        self.last_step = Some(body.steps);

        let mut result = Resolution::none();
        if body.fall_state == FallState::OnSurface {
            self.check_support(body, level, &mut result);
        } else if body.fall_state.can_land() && body.pos.y > body.prev_pos.y {
            self.check_landing(body, level, &mut result);
        }
        self.collect_tokens(body, level, &mut result);
        level.sync_support(body.surface);
        result
    }

    fn check_landing(&self, body: &mut PlayerBody, level: &Level, result: &mut Resolution) {
        let r = body.radius();
        let (prev, pos) = (body.prev_pos, body.pos);
        let bottom = pos.y + r;

        for &i in &self.platform_order {
            let platform = &level.platforms()[i];
            let top = platform.pos.y;
            if top < prev.y {
                // Everything further along is higher still
                break;
            }
            if top > bottom {
                continue;
            }
            if body.fall_state == FallState::Dropping && body.dropping_through == Some(i) {
                continue;
            }

            if meets_span(platform, prev, pos, r) {
                log::debug!(
                    "Landed on platform {i} at x={:.1}",
                    crossing_x(prev, pos, r, top)
                );
                body.land(i, top);
                result.landed = Some(i);
                break;
            }
        }
    }

    fn check_support(&self, body: &mut PlayerBody, level: &Level, result: &mut Resolution) {
        let Some(i) = body.surface else {
            return;
        };
        let span = level.platforms()[i].span();
        if span.contains(body.pos.x) {
            return;
        }

        if body.edge_guarded() {
            let edge = if body.pos.x < span.min { span.min } else { span.max };
            body.hold_at(edge);
            result.held_at_edge = true;
        } else {
            log::debug!("Walked off platform {i}");
            body.walk_off();
            result.walked_off = true;
        }
    }

    /// Tokens in scan order up to the first one wholly above `sweep_top`.
    /// Bobbing only lifts a token above its anchor, so the anchor bounds the cutoff
    /// whether or not the token was collected.
    fn token_window(&self, level: &Level, sweep_top: f32) -> &[usize] {
        let end = self
            .token_order
            .iter()
            .position(|&i| {
                let token = &level.tokens()[i];
                token.anchor.y + token.height / 2.0 < sweep_top
            })
            .unwrap_or(self.token_order.len());
        &self.token_order[..end]
    }

    fn collect_tokens(&self, body: &PlayerBody, level: &mut Level, result: &mut Resolution) {
        let r = body.radius();
        let (a, b) = (body.prev_pos, body.pos);
        let sweep_top = a.y.min(b.y) - r;
        let sweep_bottom = a.y.max(b.y) + r;

        for &i in self.token_window(level, sweep_top) {
            let token = &level.tokens()[i];
            if token.collected || token.pos.y - token.height / 2.0 > sweep_bottom {
                continue;
            }
            if sweep_touches(&token.diamond(), a, b, r) && level.collect_token(i) {
                log::debug!("Collected token {i}");
                result.tokens.push(i);
            }
        }
    }
}
