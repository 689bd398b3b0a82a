#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input box (debounced text).
    InputChanged(String),
    /// User submitted the current URL input for a batch run.
    SubmitClicked,
    /// Pre-keyed items (e.g. CSV rows) submitted for a batch run.
    ItemsSubmitted(Vec<crate::QueuedItem>),
    /// Restore previously completed items from persisted state.
    RestoreCompletedItems(Vec<crate::CompletedItemSnapshot>),
    /// User clicked Stop.
    StopClicked,
    /// Engine progress for the running batch.
    StatusUpdate { text: String, is_error: bool },
    /// Engine confirmation that a keyed item was uploaded and marked.
    ItemSucceeded { key: crate::ItemKey },
    /// Engine terminal summary for the batch.
    BatchFinished {
        succeeded: usize,
        failed: usize,
        stopped_early: bool,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
