//! Emergency Alert Engine: countdown-gated SOS activation.

mod engine;
mod session;

pub use engine::AlertEngine;
pub use session::{AlertSession, AlertSnapshot, AlertState, SessionId};
