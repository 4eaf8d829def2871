pub mod classifier;
pub mod dispatcher;
pub mod retry;
pub mod sequencer;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{AnswerDispatcher, BatchStats, RetryPolicy, SingleOutcome};
pub use retry::{RetryCoordinator, RetryReport};
pub use sequencer::{AutoFillSequencer, FillEnd, FillReport, FillTiming};
pub use summary::ResultsSummary;
