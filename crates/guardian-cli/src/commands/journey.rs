use clap::Subcommand;
use guardian_core::storage::Database;
use guardian_core::{Config, CoreError, Event, JourneyEngine, LocationError, Runtime};

use super::{print_json, report_dispatch, runtime, CmdResult};

#[derive(Subcommand)]
pub enum JourneyAction {
    /// Start a journey and track it until Ctrl-C
    Start {
        /// Where the journey starts
        #[arg(long)]
        from: String,
        /// Where the journey ends
        #[arg(long)]
        to: String,
        /// Estimated duration in minutes (default from config)
        #[arg(long)]
        minutes: Option<u32>,
        /// Return right away; resume later with `journey track`
        #[arg(long)]
        detach: bool,
    },
    /// Resume tracking the active journey until Ctrl-C
    Track,
    /// Mark the active journey completed
    Complete,
    /// Cancel the active journey
    Cancel,
    /// Share the active journey's location
    ///
    /// Waits up to 15 s for a first fix when none is known yet, then shares.
    Share {
        /// Record the share instead of opening it
        #[arg(long)]
        dry_run: bool,
    },
    /// List all journeys in creation order
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dial the journey emergency number
    Emergency {
        /// Number to dial (default: journey.emergency_number)
        #[arg(long)]
        number: Option<String>,
        /// Record the call instead of opening it
        #[arg(long)]
        dry_run: bool,
    },
}

/// Print poll events until Ctrl-C. The journey stays Active.
async fn track(rt: &mut Runtime<Database>) -> CmdResult {
    eprintln!("Tracking. Press Ctrl-C to stop; the journey stays active.");
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            events = rt.next_events() => {
                let Some(events) = events else { break };
                for event in &events {
                    print_json(event)?;
                }
            }
            _ = &mut ctrl_c => break,
        }
    }
    rt.shutdown();
    Ok(())
}

pub async fn run(action: JourneyAction) -> CmdResult {
    let mut config = Config::load_or_default();

    match action {
        JourneyAction::Start {
            from,
            to,
            minutes,
            detach,
        } => {
            let mut rt = runtime(&config, true)?;
            let minutes = minutes.unwrap_or(config.journey.default_duration_minutes);
            let event = rt.journeys.start_journey(&from, &to, minutes, &mut rt.device)?;
            print_json(&event)?;
            if detach {
                rt.shutdown();
            } else {
                track(&mut rt).await?;
            }
        }
        JourneyAction::Track => {
            let mut rt = runtime(&config, true)?;
            let event = rt
                .journeys
                .resume(&mut rt.device)
                .ok_or(CoreError::NoActiveJourney)?;
            print_json(&event)?;
            track(&mut rt).await?;
        }
        JourneyAction::Complete => {
            let mut rt = runtime(&config, true)?;
            let event = rt.journeys.complete_journey(&mut rt.device)?;
            print_json(&event)?;
        }
        JourneyAction::Cancel => {
            let mut rt = runtime(&config, true)?;
            let event = rt.journeys.cancel_journey(&mut rt.device)?;
            print_json(&event)?;
        }
        JourneyAction::Share { dry_run } => {
            let mut rt = runtime(&config, dry_run)?;
            let mut event = rt.journeys.share_current_location(&mut rt.device)?;
            // The engine only queries here. Waiting for the fix is ours.
            if matches!(event, Event::LocationRequested { .. }) {
                event = wait_and_share(&mut rt).await?;
            }
            print_json(&event)?;
            report_dispatch(rt.device.notifier.log());
        }
        JourneyAction::History { json } => {
            let db = Database::open()?;
            let engine = JourneyEngine::load(db, config.journey.clone())?;
            let history = engine.list_history();
            if json {
                print_json(&history)?;
            } else if history.is_empty() {
                println!("No journeys yet.");
            } else {
                for journey in history {
                    println!(
                        "{}  {:<9}  {} -> {}  started {}  ETA {}",
                        journey.id,
                        journey.status.to_string(),
                        journey.start_location,
                        journey.end_location,
                        journey.start_time.format("%Y-%m-%d %H:%M"),
                        journey.expected_arrival().format("%H:%M"),
                    );
                }
            }
        }
        JourneyAction::Emergency { number, dry_run } => {
            if let Some(number) = number {
                config.journey.emergency_number = number;
                config.validate()?;
            }
            let mut rt = runtime(&config, dry_run)?;
            let event = rt.journeys.call_emergency(&mut rt.device);
            print_json(&event)?;
            rt.shutdown();
            report_dispatch(rt.device.notifier.log());
        }
    }
    Ok(())
}

async fn wait_and_share(rt: &mut Runtime<Database>) -> Result<Event, Box<dyn std::error::Error>> {
    let wait = async {
        while let Some(events) = rt.next_events().await {
            for event in events {
                match event {
                    Event::JourneyLocationUpdated { .. } => return Ok(()),
                    Event::LocationUnavailable { error, .. } => return Err(CoreError::from(error)),
                    _ => {}
                }
            }
        }
        Err(CoreError::NoActiveJourney)
    };
    match tokio::time::timeout(std::time::Duration::from_secs(15), wait).await {
        Ok(result) => result?,
        Err(_) => return Err(CoreError::from(LocationError::Timeout).into()),
    }
    Ok(rt.journeys.share_current_location(&mut rt.device)?)
}
