//! `QueuePulse` Engine
//!
//! Components that talk to the remote sources on behalf of the dashboard:
//! the [`PollingController`] for the recurring fetch cycle and the
//! [`ForensicAnalyzer`] for one-shot MOS analysis.

pub mod analysis;
pub mod handle;
pub mod polling;

pub use analysis::{AnalysisState, ForensicAnalyzer};
pub use handle::PollHandle;
pub use polling::{CycleOutcome, PollingController};
