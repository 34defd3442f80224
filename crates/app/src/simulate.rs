use std::time::Duration;

use rand::{seq::IteratorRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tap_to_prosper_core::{GameConfig, GameError, Phase, Result, RngPositions, RoundEngine};

/// Knobs for the headless bot player.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub seed: u64,
    pub accuracy: f64,
    pub taps_per_tick: u32,
    pub max_rounds: u32,
    pub json: bool,
}

fn snapshot_line(engine: &RoundEngine) -> Result<String> {
    serde_json::to_string(&engine.snapshot())
        .map_err(|err| GameError::msg(format!("could not encode snapshot: {err}")))
}

pub fn run(config: GameConfig, settings: BotSettings) -> Result<()> {
    if !(0.0..=1.0).contains(&settings.accuracy) {
        return Err(GameError::msg("accuracy must be between 0 and 1"));
    }

    tracing::info!(?settings, "starting simulation");
    let step = Duration::from_millis(config.tick_interval_ms);
    let mut engine = RoundEngine::with_positions(config, RngPositions::seeded(settings.seed))?;
    let mut bot = ChaCha8Rng::seed_from_u64(settings.seed.wrapping_add(1));
    let mut reported = 0;

    engine.start();
    while engine.phase() != Phase::GameOver && reported < settings.max_rounds as usize {
        if engine.phase() == Phase::Active {
            for _ in 0..settings.taps_per_tick {
                if !bot.gen_bool(settings.accuracy) {
                    continue;
                }
                if let Some(id) = engine.registry().live_ids().choose(&mut bot) {
                    engine.tap(id);
                }
            }
        }
        engine.advance(step);

        while reported < engine.reports().len() {
            let report = engine.reports()[reported];
            reported += 1;
            if settings.json {
                println!("{}", snapshot_line(&engine)?);
            } else {
                println!(
                    "round {:>3}: busted {:>3}, cleared {:>3}, total busted {:>3} -> {:?}",
                    report.round,
                    report.busted_this_round,
                    report.cleared_this_round,
                    report.total_busted,
                    report.outcome
                );
            }
        }
    }

    // Let a pending game over land before summarising.
    engine.advance(Duration::from_millis(engine.config().transition_delay_ms));

    if !settings.json {
        println!(
            "{:?} after {} round(s): {} busted, {} missed payment(s), {:.0}s played",
            engine.phase(),
            engine.reports().len(),
            engine.total_busted(),
            engine.missed_payments(),
            engine.now().as_secs_f32()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lines_are_single_json_objects() {
        let mut engine =
            RoundEngine::with_positions(GameConfig::default(), RngPositions::seeded(1)).unwrap();
        engine.start();

        let line = snapshot_line(&engine).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["phase"], "Active");
        assert_eq!(value["round_number"], 1);
    }

    #[test]
    fn rejects_accuracy_outside_unit_range() {
        let settings = BotSettings {
            seed: 1,
            accuracy: 1.5,
            taps_per_tick: 1,
            max_rounds: 1,
            json: false,
        };
        let err = run(GameConfig::default(), settings).unwrap_err();
        assert!(matches!(err, GameError::Message(_)));
        assert!(format!("{err}").contains("accuracy"));
    }
}
