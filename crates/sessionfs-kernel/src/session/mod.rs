//! Named sessions and the registry that owns them.

mod registry;
mod types;

pub use registry::{DEFAULT_MAX_INPUT, ERROR_PREFIX, FinalizeOutcome, SessionRegistry};
pub use types::{SessionFile, SessionView};
