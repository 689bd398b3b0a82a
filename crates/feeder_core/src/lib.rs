//! Feeder core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    normalize_url_for_dedupe, AppState, CompletedItemSnapshot, ItemKey, QueuedItem, SessionState,
};
pub use update::update;
pub use view_model::{AppViewModel, LastSubmitStats, StatusLine};
