//! mpc-core: shared foundation for the receding-horizon workspace.
//!
//! Contains:
//! - numeric (finiteness checks + time comparison helpers)
//! - ids (stable compact IDs for solver variables and constraints)
//! - error (error taxonomy shared by every layer)
//! - timing (opt-in wall-clock counters for formulate/solve/advance)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult, ErrorKind};
pub use ids::*;
pub use numeric::*;
