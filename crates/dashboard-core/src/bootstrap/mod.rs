// ── Bootstrap state machine ──

mod controller;
mod dependency;
mod status;

pub use controller::{BootstrapState, InitializationController, RunOutcome};
pub use dependency::{AuthState, DependentService};
pub use status::{ErrorKind, InitError, InitializationStatus, Phase};
