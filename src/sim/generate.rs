//! Procedural level generation
//!
//! Builds an ascending chain of platforms from the bottom of the viewport to
//! the level ceiling. Every hop is sized against the analytic jump envelope
//! so the next platform is always reachable; optional side platforms (red
//! herrings) carry tokens.

use glam::Vec2;
use rand::Rng;

use super::body::{BodyParams, JumpEnvelope};
use super::geometry::Span;
use super::level::{GenerationStats, Hazard, Hop, Level, Platform, PlatformKind, Token};
use crate::consts::*;
use crate::settings::Viewport;
use crate::tuning::{Debuff, DifficultyParams, GenerationTuning};

/// Uniform sample in `[lo, hi)`, or `lo` for an empty range
fn sample<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Sample a fraction range
fn sample_range<R: Rng + ?Sized>(rng: &mut R, range: (f32, f32)) -> f32 {
    sample(rng, range.0, range.1)
}

/// Viewport-derived placement bounds for one level
#[derive(Debug, Clone, Copy)]
struct Layout {
    platform_width: f32,
    platform_height: f32,
    x_min: f32,
    x_max: f32,
    lowest_y: f32,
    top: f32,
    /// Height of the highest platform
    ceiling: f32,
    token_size: f32,
}

impl Layout {
    fn new(viewport: &Viewport, difficulty: &DifficultyParams) -> Self {
        let (w, h) = (viewport.width, viewport.height);
        let platform_width = w / PF_WIDTH_DIV;
        let top = h - h * difficulty.height_mult;
        Self {
            platform_width,
            platform_height: h / PF_HEIGHT_DIV,
            x_min: viewport.margin_x(),
            x_max: w - platform_width,
            lowest_y: h * LOWEST_PLATFORM_FRAC,
            top,
            ceiling: top + h / CEILING_DIV,
            token_size: w / T_HEIGHT_DIV,
        }
    }

    #[inline]
    fn clamp_x(&self, x: f32) -> f32 {
        x.max(self.x_min).min(self.x_max)
    }

    #[inline]
    fn clamp_y(&self, y: f32) -> f32 {
        y.max(self.ceiling).min(self.lowest_y)
    }

    #[inline]
    fn in_bounds(&self, x: f32) -> bool {
        x >= self.x_min && x <= self.x_max
    }
}

/// Platforms and tokens under construction
#[derive(Debug, Default)]
struct Build {
    platforms: Vec<Platform>,
    tokens: Vec<Token>,
    main_chain: Vec<usize>,
    hops: Vec<Hop>,
    stats: GenerationStats,
}

impl Build {
    fn push_platform(&mut self, platform: Platform) -> usize {
        self.platforms.push(platform);
        self.platforms.len() - 1
    }

    /// Rest a token on top of a platform
    fn add_token(&mut self, platform: usize, size: f32) {
        let p = &self.platforms[platform];
        let anchor = Vec2::new(p.center_x(), p.pos.y - size);
        self.tokens.push(Token::new(anchor, size, size, platform));
        self.platforms[platform].token = Some(self.tokens.len() - 1);
    }
}

/// Generates levels for one viewport and player physics
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    viewport: Viewport,
    tuning: GenerationTuning,
    envelope: JumpEnvelope,
    diameter: f32,
}

impl LevelGenerator {
    pub fn new(viewport: Viewport, tuning: GenerationTuning, params: &BodyParams) -> Self {
        Self {
            viewport,
            tuning,
            envelope: params.envelope,
            diameter: params.diameter,
        }
    }

    /// Generate a level. Deterministic for a given RNG state; always
    /// terminates within `max_hop_attempts` hop proposals.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        difficulty: &DifficultyParams,
        debuff: Debuff,
        rng: &mut R,
    ) -> Level {
        let layout = Layout::new(&self.viewport, difficulty);
        let t = &self.tuning;
        let mut build = Build::default();

        let first = if difficulty.has_ground {
            Platform::new(
                Vec2::new(layout.x_min, layout.lowest_y),
                self.viewport.width - layout.x_min,
                layout.platform_height,
                PlatformKind::Ground,
            )
        } else {
            Platform::new(
                Vec2::new(sample(rng, layout.x_min, layout.x_max), layout.lowest_y),
                layout.platform_width,
                layout.platform_height,
                PlatformKind::Step,
            )
        };
        let first = build.push_platform(first);
        build.main_chain.push(first);

        let verticality = difficulty.verticality.clamp(0.0, 1.0) as f64;
        let mut current = 0;
        let mut direction: f32 = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let mut stuck = 0;
        let mut since_red_herring = 0;

        while build.platforms[current].pos.y > layout.ceiling
            && build.stats.attempts < t.max_hop_attempts
        {
            build.stats.attempts += 1;
            let from = build.platforms[current].clone();

            // Never two vertical hops in a row, even when stuck
            let hop = if build.hops.last() == Some(&Hop::Vertical) {
                Hop::Horizontal
            } else if (t.max_stuck..2 * t.max_stuck).contains(&stuck)
                || rng.random_bool(verticality)
            {
                Hop::Vertical
            } else {
                Hop::Horizontal
            };
            let (x, y) = match hop {
                Hop::Vertical => self.vertical_hop(&from, &layout, rng),
                Hop::Horizontal => self.horizontal_hop(&from, &mut direction, &layout, rng),
            };

            if (stuck < 2 * t.max_stuck && self.crowded(&build.platforms, x, y, &layout))
                || self.stacked(&build.platforms, x, y, &layout)
            {
                stuck += 1;
                build.stats.rejected += 1;
                direction = -direction;
                continue;
            }

            stuck = 0;
            let index = build.push_platform(Platform::new(
                Vec2::new(x, y),
                layout.platform_width,
                layout.platform_height,
                PlatformKind::Step,
            ));
            build.main_chain.push(index);
            build.hops.push(hop);
            let previous = current;
            current = index;

            since_red_herring += 1;
            if difficulty.between_red_herrings > 0
                && since_red_herring >= difficulty.between_red_herrings
                && y - layout.ceiling >= self.clearance(&layout)
            {
                since_red_herring = 0;
                self.place_red_herring(&mut build, current, previous, direction, &layout, rng);
            }
        }

        if build.platforms[current].pos.y > layout.ceiling {
            build.stats.capped = true;
            log::warn!(
                "Level generation hit the attempt cap ({}) at height {:.0}; keeping {} platforms",
                t.max_hop_attempts,
                build.platforms[current].pos.y,
                build.platforms.len()
            );
        }

        if debuff == Debuff::Overworked {
            for i in 0..build.platforms.len() {
                let p = &build.platforms[i];
                if p.kind != PlatformKind::Ground && p.token.is_none() {
                    build.add_token(i, layout.token_size);
                }
            }
        }

        log::info!(
            "Generated level: {} platforms ({} on the main chain, {} red herrings), {} tokens, {} attempts",
            build.platforms.len(),
            build.main_chain.len(),
            build.stats.red_herrings,
            build.tokens.len(),
            build.stats.attempts
        );

        Level {
            viewport: self.viewport,
            difficulty: *difficulty,
            debuff,
            platforms: build.platforms,
            tokens: build.tokens,
            main_chain: build.main_chain,
            hops: build.hops,
            hazard: Hazard::new(&self.viewport, difficulty.wave_rise_time),
            top: layout.top,
            pan_offset: 0.0,
            tokens_collected: 0,
            stats: build.stats,
        }
    }

    /// Horizontal reach the generator relies on for a given rise
    #[inline]
    fn safe_reach(&self, rise: f32) -> f32 {
        self.envelope.reach_at_rise(rise) * self.tuning.reach_safety
    }

    /// Left edge of a platform placed `gap` beyond `from` in `direction`
    fn beside(&self, from: &Platform, direction: f32, gap: f32, layout: &Layout) -> f32 {
        // Keep the left-edge offset within a full-speed jump
        let gap = gap.min(self.envelope.jump_range - layout.platform_width).max(0.0);
        if direction > 0.0 {
            from.right() + gap
        } else {
            from.pos.x - gap - layout.platform_width
        }
    }

    fn vertical_hop<R: Rng + ?Sized>(
        &self,
        from: &Platform,
        layout: &Layout,
        rng: &mut R,
    ) -> (f32, f32) {
        let rise = self.envelope.jump_height * sample_range(rng, self.tuning.vertical_rise);
        let y = layout.clamp_y(from.pos.y - rise);
        let x = if from.kind == PlatformKind::Ground {
            sample(rng, layout.x_min, layout.x_max)
        } else {
            let shift = self.tuning.vertical_shift * layout.platform_width;
            from.pos.x + sample(rng, -shift, shift)
        };
        (layout.clamp_x(x), y)
    }

    fn horizontal_hop<R: Rng + ?Sized>(
        &self,
        from: &Platform,
        direction: &mut f32,
        layout: &Layout,
        rng: &mut R,
    ) -> (f32, f32) {
        let rise = self.envelope.jump_height * sample_range(rng, self.tuning.horizontal_rise);
        let y = layout.clamp_y(from.pos.y - rise);
        if from.kind == PlatformKind::Ground {
            return (sample(rng, layout.x_min, layout.x_max), y);
        }

        let reach = self.safe_reach(rise);
        let gap = reach * sample_range(rng, self.tuning.horizontal_gap);
        let mut x = self.beside(from, *direction, gap, layout);
        if !layout.in_bounds(x) {
            // Bounce off the side with a shorter hop
            *direction = -*direction;
            let gap = reach * sample_range(rng, self.tuning.reflection_gap);
            x = self.beside(from, *direction, gap, layout);
        }
        (layout.clamp_x(x), y)
    }

    /// Vertical room a body needs between two platforms
    #[inline]
    fn clearance(&self, layout: &Layout) -> f32 {
        self.diameter + layout.platform_height
    }

    /// Whether a platform at `(x, y)` would leave the player too little room
    fn crowded(&self, platforms: &[Platform], x: f32, y: f32, layout: &Layout) -> bool {
        let min_x = x - self.diameter;
        let max_x = x + layout.platform_width + self.diameter;
        platforms.iter().any(|p| {
            (p.pos.y - y).abs() < self.clearance(layout)
                && p.pos.x <= max_x
                && min_x <= p.right()
        })
    }

    /// Whether a platform at `(x, y)` would sit almost flush with one it
    /// shares columns with. The landing scan always picks the lower of such
    /// a pair, so the upper one could never be reached from below.
    /// Rejected even once the crowding check has been given up.
    fn stacked(&self, platforms: &[Platform], x: f32, y: f32, layout: &Layout) -> bool {
        let span = Span::new(x, x + layout.platform_width);
        platforms
            .iter()
            .any(|p| (p.pos.y - y).abs() < self.clearance(layout) && p.span().overlaps(&span))
    }

    /// Add a token-carrying side platform level with `current`, on the side
    /// the chain came from, within a flat jump of `current`
    fn place_red_herring<R: Rng + ?Sized>(
        &self,
        build: &mut Build,
        current: usize,
        previous: usize,
        direction: f32,
        layout: &Layout,
        rng: &mut R,
    ) {
        let cur = build.platforms[current].clone();
        let dx = build.platforms[previous].center_x() - cur.center_x();
        let side = if dx != 0.0 { dx.signum() } else { -direction };
        let gap = self.safe_reach(0.0) * sample_range(rng, self.tuning.red_herring_gap);
        let x = self.beside(&cur, side, gap, layout);
        if !layout.in_bounds(x) || self.crowded(&build.platforms, x, cur.pos.y, layout) {
            log::debug!("Skipped red herring beside platform {current}");
            return;
        }

        let index = build.push_platform(Platform::new(
            Vec2::new(x, cur.pos.y),
            layout.platform_width,
            layout.platform_height,
            PlatformKind::RedHerring,
        ));
        build.add_token(index, layout.token_size);
        build.stats.red_herrings += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::tuning::Difficulty;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn generator(settings: &Settings) -> (LevelGenerator, BodyParams) {
        let params = BodyParams::derive(&settings.body, &settings.viewport).unwrap();
        (
            LevelGenerator::new(settings.viewport, settings.generation, &params),
            params,
        )
    }

    fn generate(difficulty: Difficulty, debuff: Debuff, seed: u64) -> (Level, BodyParams) {
        let (generator, params) = generator(&Settings::default());
        let mut rng = Pcg32::seed_from_u64(seed);
        (generator.generate(&difficulty.params(), debuff, &mut rng), params)
    }

    #[test]
    fn test_determinism() {
        let (a, _) = generate(Difficulty::Hard, Debuff::None, 42);
        let (b, _) = generate(Difficulty::Hard, Debuff::None, 42);
        assert_eq!(a.platforms.len(), b.platforms.len());
        for (pa, pb) in a.platforms.iter().zip(&b.platforms) {
            assert_eq!(pa.pos, pb.pos);
            assert_eq!(pa.kind, pb.kind);
        }
        assert_eq!(a.main_chain, b.main_chain);

        let (c, _) = generate(Difficulty::Hard, Debuff::None, 43);
        assert!(a.platforms.iter().zip(&c.platforms).any(|(pa, pc)| pa.pos != pc.pos));
    }

    #[test]
    fn test_ground_start() {
        let (level, _) = generate(Difficulty::Easy, Debuff::None, 7);
        let ground = &level.platforms[0];
        assert_eq!(ground.kind, PlatformKind::Ground);
        assert_eq!(ground.pos.x, 128.0);
        assert!((ground.pos.y - 648.0).abs() < 1e-3);
        assert_eq!(ground.right(), 1280.0);

        let (level, _) = generate(Difficulty::Medium, Debuff::None, 7);
        assert_eq!(level.platforms[0].kind, PlatformKind::Step);
        assert!((level.platforms[0].pos.y - 648.0).abs() < 1e-3);
    }

    #[test]
    fn test_main_chain_is_reachable() {
        for difficulty in Difficulty::ALL {
            for seed in 0..20 {
                let (level, params) = generate(difficulty, Debuff::None, seed);
                let env = params.envelope;
                assert!(!level.stats.capped);
                for pair in level.main_chain.windows(2) {
                    let (a, b) = (&level.platforms[pair[0]], &level.platforms[pair[1]]);
                    let rise = a.pos.y - b.pos.y;
                    assert!(rise > 0.0, "seed {seed}: chain must ascend");
                    assert!(rise <= env.jump_height);
                    assert!(a.span().gap(&b.span()) <= env.jump_range);
                    if a.kind != PlatformKind::Ground {
                        assert!((b.pos.x - a.pos.x).abs() <= env.jump_range + 1e-3);
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_consecutive_vertical_hops() {
        let mut vertical = 0;
        for difficulty in Difficulty::ALL {
            for seed in 0..300 {
                let (level, _) = generate(difficulty, Debuff::None, seed);
                assert_eq!(level.hops.len() + 1, level.main_chain.len());
                for pair in level.hops.windows(2) {
                    assert!(
                        !matches!(pair, [Hop::Vertical, Hop::Vertical]),
                        "{difficulty:?} seed {seed}: two vertical hops in a row"
                    );
                }
                vertical += level.hops.iter().filter(|&&h| h == Hop::Vertical).count();
            }
        }
        assert!(vertical > 0);
    }

    #[test]
    fn test_stuck_after_vertical_hop_stays_horizontal() {
        // A single rejection forces a vertical hop when one is allowed
        let mut settings = Settings::default();
        settings.generation.max_stuck = 1;
        let (generator, _) = generator(&settings);
        let mut rejected = 0;
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let level = generator.generate(&Difficulty::Easy.params(), Debuff::None, &mut rng);
            rejected += level.stats.rejected;
            assert!(level.hops.len() >= 2);
            assert!(level.hops.contains(&Hop::Horizontal));
            assert!(
                !level
                    .hops
                    .windows(2)
                    .any(|w| matches!(w, [Hop::Vertical, Hop::Vertical]))
            );
        }
        assert!(rejected > 0);
    }

    #[test]
    fn test_no_platform_sits_flush_over_another() {
        for difficulty in Difficulty::ALL {
            for seed in 0..200 {
                let (level, params) = generate(difficulty, Debuff::None, seed);
                let clearance = params.diameter + level.platforms[0].height;
                for (i, a) in level.platforms.iter().enumerate() {
                    for b in &level.platforms[i + 1..] {
                        assert!(
                            (a.pos.y - b.pos.y).abs() >= clearance
                                || !a.span().overlaps(&b.span()),
                            "{difficulty:?} seed {seed}: platforms stacked at y={} and y={}",
                            a.pos.y,
                            b.pos.y
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_red_herring_next_to_the_ceiling() {
        let layout = Layout::new(&Viewport::default(), &Difficulty::Easy.params());
        for seed in 0..100 {
            let (level, params) = generate(Difficulty::Easy, Debuff::None, seed);
            let clearance = params.diameter + layout.platform_height;
            for p in level.platforms.iter().filter(|p| p.kind == PlatformKind::RedHerring) {
                assert!(p.pos.y - layout.ceiling >= clearance);
            }
        }
    }

    #[test]
    fn test_chain_reaches_ceiling() {
        let (level, _) = generate(Difficulty::VeryHard, Debuff::None, 3);
        let layout = Layout::new(&Viewport::default(), &Difficulty::VeryHard.params());
        let top = &level.platforms[level.highest()];
        assert!(top.pos.y <= layout.ceiling);
        assert!(top.pos.y >= layout.ceiling);
        assert_eq!(level.top, 720.0 - 720.0 * 3.0);
    }

    #[test]
    fn test_platforms_stay_in_bounds() {
        for seed in 0..10 {
            let (level, _) = generate(Difficulty::Hard, Debuff::None, seed);
            for p in level.platforms.iter().filter(|p| p.kind != PlatformKind::Ground) {
                assert!(p.pos.x >= 128.0 && p.right() <= 1280.0);
            }
        }
    }

    #[test]
    fn test_red_herrings_carry_reachable_tokens() {
        let mut seen = 0;
        for seed in 0..20 {
            let (level, params) = generate(Difficulty::Medium, Debuff::None, seed);
            let reach = params.envelope.reach_at_rise(0.0);
            for (i, p) in level.platforms.iter().enumerate() {
                if p.kind != PlatformKind::RedHerring {
                    continue;
                }
                seen += 1;
                let token = &level.tokens[p.token.unwrap()];
                assert_eq!(token.platform, i);
                assert!(token.pos.y < p.pos.y);
                // Level with some main-chain platform that is a flat jump away
                let reachable = level.main_chain.iter().any(|&c| {
                    let c = &level.platforms[c];
                    c.pos.y == p.pos.y && c.span().gap(&p.span()) <= reach
                });
                assert!(reachable, "seed {seed}: unreachable red herring {i}");
            }
            assert_eq!(level.tokens_available() as usize, level.stats.red_herrings as usize);
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_overworked_tokens_everywhere() {
        let (level, _) = generate(Difficulty::Easy, Debuff::Overworked, 11);
        for p in &level.platforms {
            match p.kind {
                PlatformKind::Ground => assert!(p.token.is_none()),
                _ => assert!(p.token.is_some()),
            }
        }
        assert_eq!(level.tokens.len(), level.platforms.len() - 1);
    }

    #[test]
    fn test_attempt_cap_terminates() {
        let mut settings = Settings::default();
        settings.generation.max_hop_attempts = 3;
        let (generator, _) = generator(&settings);
        let mut rng = Pcg32::seed_from_u64(1);
        let level = generator.generate(&Difficulty::VeryHard.params(), Debuff::None, &mut rng);
        assert!(level.stats.capped);
        assert_eq!(level.stats.attempts, 3);
        assert!(level.main_chain.len() <= 4);
    }

    #[test]
    fn test_crowding() {
        let settings = Settings::default();
        let (generator, _) = generator(&settings);
        let layout = Layout::new(&settings.viewport, &DifficultyParams::default());
        let platforms = vec![Platform::new(
            Vec2::new(500.0, 400.0),
            128.0,
            18.0,
            PlatformKind::Step,
        )];
        assert!(generator.crowded(&platforms, 600.0, 410.0, &layout));
        assert!(!generator.crowded(&platforms, 600.0, 300.0, &layout));
        assert!(!generator.crowded(&platforms, 800.0, 400.0, &layout));

        // Close beside it is crowded but not stacked; flush above it is both
        assert!(generator.crowded(&platforms, 640.0, 400.0, &layout));
        assert!(!generator.stacked(&platforms, 640.0, 400.0, &layout));
        assert!(generator.stacked(&platforms, 550.0, 395.0, &layout));
        assert!(!generator.stacked(&platforms, 550.0, 340.0, &layout));
    }

    #[test]
    fn test_red_herring_faces_previous_platform() {
        let mut seen = 0;
        for seed in 0..30 {
            let (level, _) = generate(Difficulty::Easy, Debuff::None, seed);
            for herring in level.platforms.iter().filter(|p| p.kind == PlatformKind::RedHerring) {
                let Some(k) = level
                    .main_chain
                    .iter()
                    .position(|&c| level.platforms[c].pos.y == herring.pos.y)
                else {
                    continue;
                };
                let current = &level.platforms[level.main_chain[k]];
                let previous = &level.platforms[level.main_chain[k - 1]];
                let from = previous.center_x() - current.center_x();
                if from != 0.0 {
                    seen += 1;
                    let side = herring.center_x() - current.center_x();
                    assert_eq!(side.signum(), from.signum(), "seed {seed}");
                }
            }
        }
        assert!(seen > 0);
    }
}
