//! Property tests over generated levels and random play

use dont_drown::sim::{
    BodyParams, FallState, Hop, LevelGenerator, LevelSession, PlatformKind, SteerState,
    StressModel, TickInput,
};
use dont_drown::{Debuff, Difficulty, Settings, Viewport};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(Difficulty::ALL.to_vec())
}

fn debuff() -> impl Strategy<Value = Debuff> {
    prop::sample::select(Debuff::ALL.to_vec())
}

fn input() -> impl Strategy<Value = TickInput> {
    (0u8..4, any::<bool>(), prop::bool::weighted(0.05)).prop_map(|(steer, jump, drop)| TickInput {
        steer: match steer {
            0 => None,
            1 => Some(SteerState::Left),
            2 => Some(SteerState::Right),
            _ => Some(SteerState::Neither),
        },
        jump,
        drop,
        idle_mode: false,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stress_stays_in_bounds(
        debuff in debuff(),
        distances in prop::collection::vec(0f32..3000.0, 1..500),
    ) {
        let settings = Settings::default();
        let params = BodyParams::derive(&settings.body, &settings.viewport).unwrap();
        let mut model = StressModel::new(&settings.stress, params.handling, &settings.viewport, debuff);
        for (frame, distance) in distances.into_iter().enumerate() {
            model.update(distance, frame as u64 + 1);
            prop_assert!(model.stress() >= 0.0 && model.stress() <= 100.0);
            prop_assert!(model.handling().thrust > 0.0);
            prop_assert!(model.handling().friction > 0.0);
        }
    }

    #[test]
    fn main_chain_is_reachable(
        seed in any::<u64>(),
        difficulty in difficulty(),
        width in 640f32..1920.0,
        aspect in 0.5f32..0.8,
    ) {
        let viewport = Viewport::new(width, width * aspect);
        let settings = Settings { viewport, ..Default::default() };
        let params = BodyParams::derive(&settings.body, &viewport).unwrap();
        let generator = LevelGenerator::new(viewport, settings.generation, &params);
        let level = generator.generate(&difficulty.params(), Debuff::None, &mut Pcg32::seed_from_u64(seed));
        let env = params.envelope;

        prop_assert!(!level.hops().windows(2).any(|w| matches!(w, [Hop::Vertical, Hop::Vertical])));
        for pair in level.main_chain().windows(2) {
            let a = &level.platforms()[pair[0]];
            let b = &level.platforms()[pair[1]];
            let rise = a.pos.y - b.pos.y;
            prop_assert!(rise > 0.0);
            prop_assert!(rise <= env.jump_height);
            prop_assert!(a.span().gap(&b.span()) <= env.jump_range);
            if a.kind != PlatformKind::Ground {
                prop_assert!((b.pos.x - a.pos.x).abs() <= env.jump_range + 1e-2);
            }
        }
    }

    #[test]
    fn generation_is_bounded(
        seed in any::<u64>(),
        difficulty in difficulty(),
        debuff in debuff(),
        max_hop_attempts in 1u32..200,
    ) {
        let mut settings = Settings::default();
        settings.generation.max_hop_attempts = max_hop_attempts;
        let params = BodyParams::derive(&settings.body, &settings.viewport).unwrap();
        let generator = LevelGenerator::new(settings.viewport, settings.generation, &params);
        let level = generator.generate(&difficulty.params(), debuff, &mut Pcg32::seed_from_u64(seed));

        let stats = level.stats();
        prop_assert!(stats.attempts <= max_hop_attempts);
        prop_assert!(level.platforms().len() as u32 <= 2 * stats.attempts + 1);
        prop_assert!(level.main_chain().len() as u32 <= stats.attempts + 1);
        prop_assert!(level.tokens_available() as usize <= level.platforms().len());
    }

    #[test]
    fn fall_states_follow_the_transition_graph(
        seed in any::<u64>(),
        difficulty in difficulty(),
        inputs in prop::collection::vec(input(), 1..400),
    ) {
        let mut session = LevelSession::new(&Settings::default(), difficulty.params(), Debuff::None, seed).unwrap();
        let mut state = session.body().fall_state();
        for input in &inputs {
            session.tick(input);
            let next = session.body().fall_state();
            prop_assert!(state.can_follow(next), "{:?} -> {:?}", state, next);
            if next == FallState::OnSurface {
                prop_assert!(session.body().surface().is_some());
                prop_assert_eq!(session.body().vel().y, 0.0);
            }
            state = next;
        }
    }

    #[test]
    fn token_count_is_monotonic(
        seed in any::<u64>(),
        difficulty in difficulty(),
        inputs in prop::collection::vec(input(), 1..400),
    ) {
        let mut session = LevelSession::new(&Settings::default(), difficulty.params(), Debuff::Overworked, seed).unwrap();
        let mut collected = 0;
        for input in &inputs {
            session.tick(input);
            let now = session.level().tokens_collected();
            prop_assert!(now >= collected);
            prop_assert!(now <= session.level().tokens_available());
            let flagged = session.level().tokens().iter().filter(|t| t.collected).count() as u32;
            prop_assert_eq!(flagged, now);
            collected = now;
        }
    }

    #[test]
    fn sessions_are_deterministic(seed in any::<u64>(), inputs in prop::collection::vec(input(), 1..200)) {
        let run = || {
            let mut session = LevelSession::new(&Settings::default(), Difficulty::Medium.params(), Debuff::PanicProne, seed).unwrap();
            for input in &inputs {
                session.tick(input);
            }
            (session.body().pos(), session.stress().stress(), session.level().tokens_collected())
        };
        prop_assert_eq!(run(), run());
    }
}
