use clap::Args;
use guardian_core::{Config, Event};

use super::{print_json, report_dispatch, runtime, CmdResult};

#[derive(Args)]
pub struct SosArgs {
    /// Record the call and share instead of opening them
    #[arg(long)]
    dry_run: bool,
    /// Countdown length in seconds (default from config)
    #[arg(long)]
    countdown: Option<u32>,
    /// Number to dial (default from config)
    #[arg(long)]
    number: Option<String>,
}

pub async fn run(args: SosArgs) -> CmdResult {
    let mut config = Config::load_or_default();
    if let Some(seconds) = args.countdown {
        config.alert.countdown_seconds = seconds;
    }
    if let Some(number) = args.number {
        config.alert.emergency_number = number;
    }
    config.validate()?;

    let mut rt = runtime(&config, args.dry_run)?;
    let Some(armed) = rt.alert.activate(&mut rt.device) else {
        return Ok(());
    };
    print_json(&armed)?;
    print_json(&rt.alert.snapshot())?;
    eprintln!(
        "Calling {} in {}s. Press Ctrl-C to cancel.",
        config.alert.emergency_number, config.alert.countdown_seconds
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            events = rt.next_events() => {
                let Some(events) = events else { break };
                for event in &events {
                    print_json(event)?;
                }
                if events.iter().any(|e| matches!(e, Event::AlertTriggered { .. })) {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                if let Some(event) = rt.alert.cancel(&mut rt.device) {
                    print_json(&event)?;
                    print_json(&rt.alert.snapshot())?;
                }
                break;
            }
        }
    }

    rt.shutdown();
    report_dispatch(rt.device.notifier.log());
    Ok(())
}
