use clap::Subcommand;
use guardian_core::Config;

use super::{capture_location, print_json, report_dispatch, runtime, CmdResult};

#[derive(Subcommand)]
pub enum LocationAction {
    /// Print the current position as JSON
    Get,
    /// Share the current position through the message link
    ///
    /// Waits up to 15 s for a fix first, then shares.
    Share {
        /// Record the share instead of opening it
        #[arg(long)]
        dry_run: bool,
    },
}

pub async fn run(action: LocationAction) -> CmdResult {
    let config = Config::load_or_default();

    match action {
        LocationAction::Get => {
            let mut rt = runtime(&config, true)?;
            let location = capture_location(&mut rt).await?;
            print_json(&serde_json::json!({
                "latitude": location.latitude,
                "longitude": location.longitude,
                "maps_link": location.maps_link(&config.share.maps_url),
            }))?;
        }
        LocationAction::Share { dry_run } => {
            let mut rt = runtime(&config, dry_run)?;
            capture_location(&mut rt).await?;
            let event = rt.alert.share_location(&mut rt.device);
            print_json(&event)?;
            report_dispatch(rt.device.notifier.log());
        }
    }
    Ok(())
}
