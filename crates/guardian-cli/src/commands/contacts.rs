use clap::Subcommand;
use guardian_core::storage::Database;
use guardian_core::{Config, ContactBook};

use super::{dial_device, print_json, report_dispatch, CmdResult};

#[derive(Subcommand)]
pub enum ContactsAction {
    /// Add a contact
    Add {
        /// Contact name
        name: String,
        /// Phone number
        phone: String,
        /// Relationship (e.g. "Sister", "Friend")
        relationship: String,
    },
    /// List contacts as JSON
    List,
    /// Remove a contact by id
    Remove {
        /// Contact ID
        id: String,
    },
    /// Dial a contact by id
    Call {
        /// Contact ID
        id: String,
        /// Record the call instead of opening it
        #[arg(long)]
        dry_run: bool,
    },
    /// List the emergency number directory from the config
    Numbers,
}

pub fn run(action: ContactsAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut book = ContactBook::load(Database::open()?)?;

    match action {
        ContactsAction::Add {
            name,
            phone,
            relationship,
        } => {
            let contact = book.add(&name, &phone, &relationship)?;
            print_json(&contact)?;
        }
        ContactsAction::List => {
            print_json(&book.list())?;
        }
        ContactsAction::Remove { id } => {
            let removed = book.remove(&id)?;
            eprintln!("Removed {}", removed.name);
            print_json(&removed)?;
        }
        ContactsAction::Call { id, dry_run } => {
            let mut device = dial_device(&config, dry_run);
            let event = book.call(&id, &mut device)?;
            print_json(&event)?;
            report_dispatch(device.notifier.log());
        }
        ContactsAction::Numbers => {
            print_json(&config.emergency_numbers)?;
        }
    }
    Ok(())
}
