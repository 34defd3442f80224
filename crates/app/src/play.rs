use std::{
    io::{self, BufRead},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use tap_to_prosper_core::{
    CommandOutcome, GameConfig, ObjectId, Phase, Result, RngPositions, RoundEngine, Snapshot,
    TapOutcome,
};

const IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Start,
    Tap(ObjectId),
    Status,
    Restart,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let input = match command {
        "start" | "s" => Input::Start,
        "tap" | "t" => Input::Tap(words.next()?.parse().ok()?),
        "status" | "?" => Input::Status,
        "restart" | "r" => Input::Restart,
        "help" | "h" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => Input::Tap(other.parse().ok()?),
    };
    Some(input)
}

/// Runs a real-time game. Stdin is read on a helper thread that only forwards
/// lines; the engine lives on this thread and is advanced by wall-clock time.
pub fn run(config: GameConfig, seed: Option<u64>) -> Result<()> {
    let positions = match seed {
        Some(seed) => RngPositions::seeded(seed),
        None => RngPositions::from_entropy(),
    };
    let mut engine = RoundEngine::with_positions(config, positions)?;

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    print_help();
    let mut shown = engine.snapshot();
    render(&shown, engine.config().clearance_taps);
    let mut last = Instant::now();

    loop {
        let wait = engine.until_next_event().unwrap_or(IDLE_WAIT);
        let received = rx.recv_timeout(wait);
        let now = Instant::now();
        let elapsed = now.duration_since(last);
        last = now;

        match received {
            Ok(line) => {
                // Time up to just before the input arrived, then the input,
                // then whatever is due at this instant.
                let early = elapsed.saturating_sub(Duration::from_millis(1));
                engine.advance(early);
                let input = parse_input(&line);
                if input == Some(Input::Quit) {
                    break;
                }
                handle(&mut engine, input);
                engine.advance(elapsed - early);
            }
            Err(RecvTimeoutError::Timeout) => engine.advance(elapsed),
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let snapshot = engine.snapshot();
        if snapshot != shown {
            render(&snapshot, engine.config().clearance_taps);
            shown = snapshot;
        }
    }

    tracing::info!(
        rounds = engine.reports().len(),
        total_busted = engine.total_busted(),
        "leaving game"
    );
    Ok(())
}

fn handle(engine: &mut RoundEngine, input: Option<Input>) {
    match input {
        Some(Input::Start) => report_command(engine.start()),
        Some(Input::Restart) => report_command(engine.restart()),
        Some(Input::Tap(id)) => match engine.tap(id) {
            TapOutcome::Cleared { id } => println!("object {id} paid off"),
            TapOutcome::Counted { .. } => {}
            TapOutcome::Ignored(reason) => println!("ignored: {reason}"),
        },
        Some(Input::Status) => render(&engine.snapshot(), engine.config().clearance_taps),
        Some(Input::Help) => print_help(),
        Some(Input::Quit) => {}
        None => println!("unrecognised input, type `help` for commands"),
    }
}

fn report_command(outcome: CommandOutcome) {
    if let CommandOutcome::Ignored(reason) = outcome {
        println!("ignored: {reason}");
    }
}

fn print_help() {
    println!("Tap To Prosper");
    println!("  Every bag needs three taps to be paid off. A bag left untapped for a");
    println!("  whole round is busted; too many busted bags and the game is over.");
    println!("commands: start | tap <id> (or just <id>) | status | restart | help | quit");
}

fn render(snapshot: &Snapshot, clearance_taps: u32) {
    match snapshot.phase {
        Phase::NotStarted => {
            println!("-- type `start` to begin --");
            return;
        }
        Phase::GameOver => {
            println!("== Game Over ==");
            println!(
                "total busted bags: {}  missed payments: {}",
                snapshot.total_busted, snapshot.missed_payments
            );
            println!("-- type `restart` to play again --");
            return;
        }
        Phase::Active | Phase::RoundEndTransition => {}
    }

    println!(
        "round {} | {}s left | busted {} | missed payments {}",
        snapshot.round_number,
        snapshot.time_remaining,
        snapshot.total_busted,
        snapshot.missed_payments
    );
    for object in &snapshot.objects {
        if object.busted {
            println!(
                "  [{:>3}] BUSTED      at ({:>4.1}%, {:>4.1}%)",
                object.id, object.position.top, object.position.left
            );
        } else {
            println!(
                "  [{:>3}] paid {}/{} (+{}) at ({:>4.1}%, {:>4.1}%)",
                object.id,
                object.total_taps,
                clearance_taps,
                object.round_taps,
                object.position.top,
                object.position.left
            );
        }
    }
    if let Some(notice) = &snapshot.notice {
        println!("** {notice} **");
    }
}
