//! Level data
//!
//! Platforms, tokens and the rising wave. Everything here is created by the
//! generator and afterwards only moved (pan, bob, hazard rise) or flagged
//! (token collected, platform supporting the player).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Diamond, Span};
use crate::consts::*;
use crate::settings::Viewport;
use crate::tuning::{Debuff, DifficultyParams};

/// Role of a platform in the generated layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Full-width starting floor
    Ground,
    /// Part of the ascending main chain
    Step,
    /// Optional side platform carrying a token
    RedHerring,
}

/// How a main-chain platform was reached from the one below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hop {
    /// Sideways with a moderate rise
    Horizontal,
    /// Nearly straight up, close to the full jump height
    Vertical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub kind: PlatformKind,
    pub supporting_player: bool,
    /// Token resting on this platform
    pub token: Option<usize>,
}

impl Platform {
    pub fn new(pos: Vec2, width: f32, height: f32, kind: PlatformKind) -> Self {
        Self {
            pos,
            width,
            height,
            kind,
            supporting_player: false,
            token: None,
        }
    }

    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.pos.x, self.pos.x + self.width)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.width
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.width / 2.0
    }
}

/// A collectable token; bobs around its anchor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Rest centre (moves only with the pan)
    pub anchor: Vec2,
    /// Current centre
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub collected: bool,
    /// Platform the token sits on
    pub platform: usize,
}

impl Token {
    pub fn new(anchor: Vec2, width: f32, height: f32, platform: usize) -> Self {
        Self {
            anchor,
            pos: anchor,
            width,
            height,
            collected: false,
            platform,
        }
    }

    pub fn diamond(&self) -> Diamond {
        Diamond::new(self.pos, self.width, self.height)
    }

    /// Vertical bob offset at `frame`: a triangle wave rising a quarter of
    /// the token height over `T_BOUNCE_FRAMES` and settling back.
    pub fn bob_offset(&self, frame: u64) -> f32 {
        let step = self.height / 4.0 / T_BOUNCE_FRAMES as f32;
        let phase = frame % (2 * T_BOUNCE_FRAMES);
        let lift = if phase < T_BOUNCE_FRAMES {
            phase
        } else {
            2 * T_BOUNCE_FRAMES - phase
        };
        -(lift as f32) * step
    }

    pub fn integrate(&mut self, frame: u64) {
        if !self.collected {
            self.pos = self.anchor + Vec2::new(0.0, self.bob_offset(frame));
        }
    }
}

/// The rising wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Surface height
    pub y: f32,
    /// Pixels per frame
    pub rise_rate: f32,
}

impl Hazard {
    pub fn new(viewport: &Viewport, wave_rise_time: f32) -> Self {
        Self {
            y: viewport.height + viewport.width / WAVE_INIT_HEIGHT_MOD_DIV,
            rise_rate: viewport.height / (FRAME_RATE * wave_rise_time),
        }
    }

    #[inline]
    pub fn integrate(&mut self) {
        self.y -= self.rise_rate;
    }
}

/// Generation bookkeeping, for logs and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Hop proposals made
    pub attempts: u32,
    /// Proposals rejected as crowded
    pub rejected: u32,
    pub red_herrings: u32,
    /// Stopped by the attempt cap before reaching the ceiling
    pub capped: bool,
}

/// A generated level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub(crate) viewport: Viewport,
    pub(crate) difficulty: DifficultyParams,
    pub(crate) debuff: Debuff,
    /// Generation order
    pub(crate) platforms: Vec<Platform>,
    pub(crate) tokens: Vec<Token>,
    /// Indices of the ascending chain, bottom first
    pub(crate) main_chain: Vec<usize>,
    /// `hops[i]` led from `main_chain[i]` to `main_chain[i + 1]`
    pub(crate) hops: Vec<Hop>,
    pub(crate) hazard: Hazard,
    /// Level top at generation time (negative: above the viewport)
    pub(crate) top: f32,
    pub(crate) pan_offset: f32,
    pub(crate) tokens_collected: u32,
    pub(crate) stats: GenerationStats,
}

impl Level {
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn difficulty(&self) -> &DifficultyParams {
        &self.difficulty
    }

    pub fn debuff(&self) -> Debuff {
        self.debuff
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn main_chain(&self) -> &[usize] {
        &self.main_chain
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Index of the goal platform
    pub fn highest(&self) -> usize {
        self.main_chain.last().copied().unwrap_or(0)
    }

    pub fn hazard(&self) -> &Hazard {
        &self.hazard
    }

    /// Current top of the level in screen space
    pub fn top(&self) -> f32 {
        self.top + self.pan_offset
    }

    /// Current bottom of the level in screen space
    pub fn bottom(&self) -> f32 {
        self.viewport.height + self.pan_offset
    }

    pub fn pan_offset(&self) -> f32 {
        self.pan_offset
    }

    pub fn tokens_collected(&self) -> u32 {
        self.tokens_collected
    }

    pub fn tokens_available(&self) -> u32 {
        self.tokens.len() as u32
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Advance hazard and token bob by one frame
    pub fn integrate(&mut self, frame: u64) {
        self.hazard.integrate();
        for token in &mut self.tokens {
            token.integrate(frame);
        }
    }

    /// Scroll everything down by up to `dy`, never past the level top.
    /// Returns the distance actually scrolled.
    pub fn pan(&mut self, dy: f32) -> f32 {
        let room = (-self.top()).max(0.0);
        let applied = dy.min(room).max(0.0);
        if applied == 0.0 {
            return 0.0;
        }
        let shift = Vec2::new(0.0, applied);
        for platform in &mut self.platforms {
            platform.pos += shift;
        }
        for token in &mut self.tokens {
            token.anchor += shift;
            token.pos += shift;
        }
        self.hazard.y += applied;
        self.pan_offset += applied;
        applied
    }

    /// Mark a token collected; false if it already was
    pub(crate) fn collect_token(&mut self, index: usize) -> bool {
        match self.tokens.get_mut(index) {
            Some(token) if !token.collected => {
                token.collected = true;
                self.tokens_collected += 1;
                true
            }
            _ => false,
        }
    }

    /// Point the `supporting_player` flags at `surface`
    pub(crate) fn sync_support(&mut self, surface: Option<usize>) {
        for (i, platform) in self.platforms.iter_mut().enumerate() {
            platform.supporting_player = surface == Some(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::new(Vec2::new(100.0, 100.0), 32.0, 32.0, 0)
    }

    fn level() -> Level {
        let viewport = Viewport::new(800.0, 600.0);
        let mut platforms = vec![
            Platform::new(Vec2::new(80.0, 540.0), 720.0, 15.0, PlatformKind::Ground),
            Platform::new(Vec2::new(300.0, 450.0), 80.0, 15.0, PlatformKind::Step),
        ];
        platforms[1].token = Some(0);
        Level {
            viewport,
            difficulty: DifficultyParams::default(),
            debuff: Debuff::None,
            platforms,
            tokens: vec![Token::new(Vec2::new(340.0, 430.0), 20.0, 20.0, 1)],
            main_chain: vec![0, 1],
            hops: vec![Hop::Horizontal],
            hazard: Hazard::new(&viewport, 12.0),
            top: -300.0,
            pan_offset: 0.0,
            tokens_collected: 0,
            stats: GenerationStats::default(),
        }
    }

    #[test]
    fn test_token_bob_is_periodic() {
        let t = token();
        assert_eq!(t.bob_offset(0), 0.0);
        // Peak lift is a quarter of the height
        assert!((t.bob_offset(T_BOUNCE_FRAMES) + 8.0).abs() < 1e-4);
        assert_eq!(t.bob_offset(2 * T_BOUNCE_FRAMES), 0.0);
        assert_eq!(t.bob_offset(7), t.bob_offset(7 + 2 * T_BOUNCE_FRAMES));
        assert!(t.bob_offset(10) < t.bob_offset(5));
    }

    #[test]
    fn test_collected_token_stops_bobbing() {
        let mut t = token();
        t.integrate(10);
        let pos = t.pos;
        t.collected = true;
        t.integrate(20);
        assert_eq!(t.pos, pos);
    }

    #[test]
    fn test_hazard_rises() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut hazard = Hazard::new(&viewport, 12.0);
        assert_eq!(hazard.y, 640.0);
        hazard.integrate();
        assert!((hazard.y - (640.0 - 600.0 / 720.0)).abs() < 1e-4);
    }

    #[test]
    fn test_pan_stops_at_level_top() {
        let mut level = level();
        assert_eq!(level.pan(100.0), 100.0);
        assert_eq!(level.platforms[1].pos.y, 550.0);
        assert_eq!(level.tokens[0].anchor.y, 530.0);
        assert_eq!(level.hazard.y, 740.0);
        // Only 200 px of level remain above the viewport
        assert_eq!(level.pan(500.0), 200.0);
        assert_eq!(level.top(), 0.0);
        assert_eq!(level.pan(10.0), 0.0);
        assert_eq!(level.pan(-10.0), 0.0);
    }

    #[test]
    fn test_collect_token_counts_once() {
        let mut level = level();
        assert!(level.collect_token(0));
        assert!(!level.collect_token(0));
        assert!(!level.collect_token(5));
        assert_eq!(level.tokens_collected(), 1);
    }

    #[test]
    fn test_sync_support() {
        let mut level = level();
        level.sync_support(Some(1));
        assert!(!level.platforms[0].supporting_player);
        assert!(level.platforms[1].supporting_player);
        level.sync_support(None);
        assert!(level.platforms.iter().all(|p| !p.supporting_player));
        assert_eq!(level.highest(), 1);
    }
}
