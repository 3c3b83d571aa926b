//! Value Objects Module
//!
//! Immutable domain values with behaviour owned by the type.

pub mod probe;
pub mod resolution;
pub mod task_state;
pub mod title;
pub mod trouble;

pub use probe::{EpisodicHint, ProbeReport};
pub use resolution::Resolution;
pub use task_state::{ProgressSample, TaskState};
pub use title::{TitleCandidate, TitleKind};
pub use trouble::{ResolutionMethod, Trouble};
