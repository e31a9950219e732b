//! Level session
//!
//! Owns one level's body, stress, level and collision state and advances them
//! in a fixed order each frame: stress, body, level and pan, collisions, then
//! the win/lose check.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::autopilot::Autopilot;
use super::body::{BodyParams, FallState, PlayerBody, SteerState};
use super::collision::{CollisionResolver, Resolution};
use super::generate::LevelGenerator;
use super::geometry::Span;
use super::level::{Level, PlatformKind};
use super::stress::StressModel;
use crate::consts::*;
use crate::error::SimError;
use crate::settings::Settings;
use crate::tuning::{Debuff, DifficultyParams};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// New steer direction; `None` keeps the current one
    pub steer: Option<SteerState>,
    pub jump: bool,
    /// Drop through the current platform
    pub drop: bool,
    /// Idle/demo mode - the autopilot plays
    pub idle_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Playing,
    /// Reached the highest platform
    Complete,
    /// Caught by the wave
    Failed,
}

/// Result of a finished (or abandoned) level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelOutcome {
    pub completed: bool,
    pub tokens_collected: u32,
    pub tokens_available: u32,
    pub frames: u64,
}

/// RNG state wrapper; each level draws from a fresh stream of the run seed
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// RNG for the next level
    fn next_rng(&mut self) -> Pcg32 {
        let rng = if self.stream == 0 {
            Pcg32::seed_from_u64(self.seed)
        } else {
            Pcg32::new(self.seed, self.stream)
        };
        self.stream += 1;
        rng
    }
}

#[derive(Debug, Clone)]
pub struct LevelSession {
    settings: Settings,
    params: BodyParams,
    generator: LevelGenerator,
    rng_state: RngState,
    difficulty: DifficultyParams,
    body: PlayerBody,
    level: Level,
    stress: StressModel,
    resolver: CollisionResolver,
    autopilot: Autopilot,
    phase: Phase,
    /// Frames ticked on this level
    frame: u64,
    /// Result of the latest collision pass
    last_resolution: Resolution,
}

impl LevelSession {
    /// Build a session and generate its first level
    pub fn new(
        settings: &Settings,
        difficulty: DifficultyParams,
        debuff: Debuff,
        seed: u64,
    ) -> Result<Self, SimError> {
        settings.validate()?;
        let params = BodyParams::derive(&settings.body, &settings.viewport)?;
        let generator = LevelGenerator::new(settings.viewport, settings.generation, &params);
        let mut rng_state = RngState::new(seed);
        let level = generator.generate(&difficulty, debuff, &mut rng_state.next_rng());

        let env = &params.envelope;
        log::info!(
            "Session seed {seed}: jump height {:.1}px, range {:.1}px, airtime {} frames",
            env.jump_height,
            env.jump_range,
            env.jump_frames()
        );

        let mut session = Self {
            settings: settings.clone(),
            params,
            generator,
            rng_state,
            difficulty,
            body: PlayerBody::new(params, Vec2::ZERO),
            stress: StressModel::new(&settings.stress, params.handling, &settings.viewport, debuff),
            resolver: CollisionResolver::new(&level),
            level,
            autopilot: Autopilot::default(),
            phase: Phase::Playing,
            frame: 0,
            last_resolution: Resolution::none(),
        };
        session.spawn();
        Ok(session)
    }

    /// Discard the level and generate a new one from the session's RNG stream
    pub fn regenerate(&mut self, difficulty: DifficultyParams, debuff: Debuff) {
        self.difficulty = difficulty;
        self.level = self
            .generator
            .generate(&difficulty, debuff, &mut self.rng_state.next_rng());
        self.stress = StressModel::new(
            &self.settings.stress,
            self.params.handling,
            &self.settings.viewport,
            debuff,
        );
        self.resolver = CollisionResolver::new(&self.level);
        self.autopilot = Autopilot::default();
        self.phase = Phase::Playing;
        self.frame = 0;
        self.last_resolution = Resolution::none();
        self.spawn();
    }

    /// Stand the body on the bottom of the main chain
    fn spawn(&mut self) {
        let start = self.level.main_chain()[0];
        let platform = &self.level.platforms()[start];
        let x = match platform.kind {
            PlatformKind::Ground => self.settings.viewport.width / 2.0,
            _ => platform.center_x(),
        };
        self.body = PlayerBody::standing(self.params, x, start, platform.pos.y);
        self.level.sync_support(Some(start));
    }

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn stress(&self) -> &StressModel {
        &self.stress
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn difficulty(&self) -> &DifficultyParams {
        &self.difficulty
    }

    pub fn debuff(&self) -> Debuff {
        self.level.debuff()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Collision result of the latest tick
    pub fn last_resolution(&self) -> &Resolution {
        &self.last_resolution
    }

    pub fn steer(&mut self, direction: SteerState) {
        self.body.steer(direction);
    }

    pub fn jump(&mut self) {
        self.body.jump();
    }

    /// Drop through the supporting platform; the ground cannot be dropped through
    pub fn drop_through(&mut self) {
        if self.body.fall_state() != FallState::OnSurface {
            return;
        }
        let on_ground = self
            .body
            .surface()
            .is_some_and(|i| self.level.platforms()[i].kind == PlatformKind::Ground);
        if !on_ground {
            self.body.drop_through();
        }
    }

    fn apply_input(&mut self, input: &TickInput) {
        if let Some(direction) = input.steer {
            self.steer(direction);
        }
        if input.jump {
            self.jump();
        }
        if input.drop {
            self.drop_through();
        }
    }

    /// Advance one frame. Returns the outcome on the frame the level ends;
    /// once ended, further ticks do nothing.
    pub fn tick(&mut self, input: &TickInput) -> Option<LevelOutcome> {
        if self.phase != Phase::Playing {
            return None;
        }

        let bounds = Span::new(0.0, self.settings.viewport.width);
        let mut input = *input;
        if input.idle_mode {
            input = self
                .autopilot
                .input(&self.body, &self.level, self.stress.handling(), bounds);
        }
        self.apply_input(&input);

        self.frame += 1;

        let distance = (self.level.hazard().y - self.body.pos().y).abs();
        self.stress.update(distance, self.frame);

        self.body.integrate(self.stress.handling(), bounds);

        self.level.integrate(self.frame);
        self.pan();

        self.last_resolution = self.resolver.resolve(&mut self.body, &mut self.level);

        self.check_end()
    }

    /// Scroll the level down while the body is above the pan line
    fn pan(&mut self) {
        let line = self.settings.viewport.height / PAN_LINE_DIV;
        let y = self.body.pos().y;
        if y < line {
            let applied = self.level.pan((line - y) * PAN_EASE);
            if applied > 0.0 {
                self.body.translate(applied);
            }
        }
    }

    fn check_end(&mut self) -> Option<LevelOutcome> {
        if self.body.surface() == Some(self.level.highest()) {
            self.phase = Phase::Complete;
        } else if self.body.pos().y > self.level.hazard().y {
            self.phase = Phase::Failed;
        } else {
            return None;
        }

        let outcome = self.outcome();
        log::info!(
            "Level {} after {} frames: {}/{} tokens",
            if outcome.completed { "complete" } else { "failed" },
            outcome.frames,
            outcome.tokens_collected,
            outcome.tokens_available
        );
        Some(outcome)
    }

    /// Outcome so far; `completed` only once the goal is reached
    pub fn outcome(&self) -> LevelOutcome {
        LevelOutcome {
            completed: self.phase == Phase::Complete,
            tokens_collected: self.level.tokens_collected(),
            tokens_available: self.level.tokens_available(),
            frames: self.frame,
        }
    }
}
