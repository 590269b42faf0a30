// ABOUTME: Deploy orchestration: platform selection, both backends, and the pipeline.
// ABOUTME: Exports the pipeline entry point and the seams it drives.

mod backend;
mod error;
mod machines;
mod pipeline;
mod release;
pub mod watch;

pub use backend::{SelectionState, select_backend};
pub use error::{DeployError, DeployErrorKind};
pub use machines::{MachineRolloutOrchestrator, RolloutEngine, RolloutError, RolloutSpec};
pub use pipeline::{DeployPipeline, DeployReport};
pub use release::{ReleaseOrchestrator, normalize_strategy};
pub use watch::{PollingWatcher, ReleaseWatcher, WatchError, poll_until_terminal};
