//! Journey Tracking Engine: journey lifecycle, periodic location polling,
//! persisted history.

mod engine;
mod model;

pub use engine::JourneyEngine;
pub use model::{Journey, JourneyId, JourneyStatus};
