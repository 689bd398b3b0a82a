#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a batch run over the given items, in order.
    StartBatch { items: Vec<crate::QueuedItem> },
    /// Ask the running batch to stop at the next item boundary.
    RequestStop,
}
