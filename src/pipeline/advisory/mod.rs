mod queue;
mod worker;

pub use queue::{AdvisoryMessage, AdvisoryPolicy, AdvisoryQueue, EnqueueOutcome};
pub use worker::{PlaybackStats, SpeechWorker};
