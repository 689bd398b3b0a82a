use crate::SessionState;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LastSubmitStats {
    pub enqueued: usize,
    pub skipped: usize,
}

/// Latest progress or completion line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub queued_count: usize,
    pub completed_count: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub stopped_early: bool,
    pub status: Option<StatusLine>,
    pub last_submit: Option<LastSubmitStats>,
    pub dirty: bool,
}
