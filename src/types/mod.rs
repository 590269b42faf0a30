// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod app_name;
mod id;
mod kv;

pub use app_name::{AppName, AppNameError};
pub use id::{EvaluationId, Id, ReleaseCommandId, ReleaseId, RolloutId};
pub use kv::{ParseKvError, parse_kv_pairs};
