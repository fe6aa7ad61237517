use crate::outcome::ProvisionOutcome;

/// Receives progress events from a provision run.
///
/// Implementations decide how to present them: the CLI draws a counter on
/// stderr, tests record the events, library callers can ignore them.
/// With concurrent fetching, `advanced` may be called out of index order.
pub trait ProgressObserver: Send + Sync {
    /// The fetch loop is about to start `total` downloads.
    fn started(&self, _total: u32) {}

    /// One index finished, successfully or not.
    fn advanced(&self, index: u32, succeeded: bool);

    /// The run is over.
    fn completed(&self, _outcome: &ProvisionOutcome) {}
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn advanced(&self, _index: u32, _succeeded: bool) {}
}
