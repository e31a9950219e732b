//! Don't Drown headless runner
//!
//! Plays one level with the autopilot and prints the outcome as JSON.
//!
//! Usage: `dont-drown [seed] [difficulty] [debuff]`
//! Settings are read from `$DONT_DROWN_SETTINGS` (JSON) when set. When
//! `$DONT_DROWN_SCORES` names a file, the outcome is recorded there as a best
//! result per difficulty and debuff.

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

#[cfg(not(target_arch = "wasm32"))]
use dont_drown::{
    Debuff, Difficulty, Scoreboard, Settings, SimError,
    consts::FRAME_RATE,
    sim::{LevelSession, TickInput},
};

/// Give up after this many seconds of play
#[cfg(not(target_arch = "wasm32"))]
const MAX_SECONDS: u64 = 180;

#[cfg(not(target_arch = "wasm32"))]
fn parse_debuff(s: &str) -> Option<Debuff> {
    let wanted = s.to_lowercase().replace(['-', '_', ' ', '\''], "");
    Debuff::ALL.into_iter().find(|d| {
        let name = format!("{d:?}").to_lowercase();
        let label = d.label().to_lowercase().replace(['-', ' ', '\''], "");
        name == wanted || label == wanted
    })
}

/// Read the scoreboard file, starting fresh if it does not exist yet
#[cfg(not(target_arch = "wasm32"))]
fn load_scores(path: &Path) -> Result<Scoreboard, SimError> {
    match std::fs::read_to_string(path) {
        Ok(json) => Scoreboard::from_json(&json),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No scoreboard at {}, starting fresh", path.display());
            Ok(Scoreboard::new())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), SimError> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s
            .parse::<u64>()
            .map_err(|e| SimError::InvalidSettings(format!("seed '{s}': {e}")))?,
        None => 0,
    };
    let difficulty = match args.next() {
        Some(s) => Difficulty::from_str(&s)
            .ok_or_else(|| SimError::InvalidSettings(format!("unknown difficulty '{s}'")))?,
        None => Difficulty::default(),
    };
    let debuff = match args.next() {
        Some(s) => parse_debuff(&s)
            .ok_or_else(|| SimError::InvalidSettings(format!("unknown debuff '{s}'")))?,
        None => Debuff::default(),
    };

    let settings = match std::env::var_os("DONT_DROWN_SETTINGS") {
        Some(path) => Settings::load_or_default(Path::new(&path))?,
        None => Settings::default(),
    };

    log::info!(
        "Playing {} / {} with seed {seed}",
        difficulty.as_str(),
        debuff.label()
    );
    let mut session = LevelSession::new(&settings, difficulty.params(), debuff, seed)?;
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let max_frames = MAX_SECONDS * FRAME_RATE as u64;
    let mut outcome = None;
    while outcome.is_none() && session.frame() < max_frames {
        outcome = session.tick(&input);
    }
    let outcome = outcome.unwrap_or_else(|| {
        log::warn!("Stopped after {max_frames} frames without an ending");
        session.outcome()
    });

    if let Some(path) = std::env::var_os("DONT_DROWN_SCORES") {
        let path = Path::new(&path);
        let mut scores = load_scores(path)?;
        if scores.record(difficulty, debuff, outcome) {
            std::fs::write(path, scores.to_json()?)?;
            log::info!("Scoreboard saved to {}", path.display());
        } else if let Some(best) = scores.best(difficulty, debuff) {
            log::info!(
                "Best for {} / {} stands: {}/{} tokens in {} frames",
                difficulty.as_str(),
                debuff.label(),
                best.tokens_collected,
                best.tokens_available,
                best.frames
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Don't Drown (headless) starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use dont_drown::sim::LevelOutcome;

    #[test]
    fn test_scores_file_keeps_best_across_runs() {
        let path = std::env::temp_dir().join(format!("dont-drown-scores-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut board = load_scores(&path).unwrap();
        assert!(board.is_empty());
        let outcome = LevelOutcome {
            completed: true,
            tokens_collected: 2,
            tokens_available: 4,
            frames: 900,
        };
        assert!(board.record(Difficulty::Easy, Debuff::None, outcome));
        std::fs::write(&path, board.to_json().unwrap()).unwrap();
        assert_eq!(load_scores(&path).unwrap(), board);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_scores(&path), Err(SimError::Json(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_parse_debuff_accepts_names_and_labels() {
        assert_eq!(parse_debuff("cant-unwind"), Some(Debuff::CantUnwind));
        assert_eq!(parse_debuff("Can't Unwind"), Some(Debuff::CantUnwind));
        assert_eq!(parse_debuff("lackcontrast"), Some(Debuff::LackContrast));
        assert_eq!(parse_debuff("none"), Some(Debuff::None));
        assert_eq!(parse_debuff("sleepy"), None);
    }
}
