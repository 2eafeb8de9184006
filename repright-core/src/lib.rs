pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use api::WorkoutApi;
pub use config::ApiConfig;
pub use error::SessionError;
pub use session::{ExerciseResult, HistoryBrowser, SessionState, WorkoutSessionController, WorkoutStatus};

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
mod runtime;
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;
