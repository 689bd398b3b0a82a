use crate::{AppState, Effect, Msg, QueuedItem, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SubmitClicked => {
            let items = parse_url_list(state.input())
                .into_iter()
                .map(|url| QueuedItem { key: None, url })
                .collect();
            submit_items(&mut state, items)
        }
        Msg::ItemsSubmitted(items) => submit_items(&mut state, items),
        Msg::StopClicked => {
            if state.session() == SessionState::Running {
                state.request_stop();
                state.set_status("Stopping after the current item...".to_string(), false);
                vec![Effect::RequestStop]
            } else {
                Vec::new()
            }
        }
        Msg::RestoreCompletedItems(snapshot) => {
            state.restore_completed(snapshot);
            Vec::new()
        }
        Msg::StatusUpdate { text, is_error } => {
            state.set_status(text, is_error);
            Vec::new()
        }
        Msg::ItemSucceeded { key } => {
            state.record_item_success(key);
            Vec::new()
        }
        Msg::BatchFinished {
            succeeded,
            failed,
            stopped_early,
        } => {
            state.finish_batch(succeeded, failed, stopped_early);
            let mut text = format!("Finished. Success: {succeeded}, Failed: {failed}");
            if stopped_early {
                text.push_str(" (stopped early)");
            }
            state.set_status(text, failed > 0);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit_items(state: &mut AppState, items: Vec<QueuedItem>) -> Vec<Effect> {
    if items.is_empty() {
        state.set_status("No valid URLs entered.".to_string(), true);
        return Vec::new();
    }

    // A second submit while a batch runs is rejected, never queued; the
    // running batch and its counts are untouched.
    match state.session() {
        SessionState::Running | SessionState::Stopping => {
            state.set_status("A batch is already running.".to_string(), true);
            return Vec::new();
        }
        SessionState::Idle => {}
    }

    let total = items.len();
    let remaining: Vec<QueuedItem> = items
        .into_iter()
        .filter(|item| !state.is_already_completed(item))
        .collect();
    let skipped = total - remaining.len();
    state.set_last_submit_stats(remaining.len(), skipped);

    if remaining.is_empty() {
        state.set_status(
            format!("Nothing to do: all {total} URLs already uploaded."),
            false,
        );
        return Vec::new();
    }

    state.set_status(
        format!("Found {} URLs. Starting upload...", remaining.len()),
        false,
    );
    state.start_batch(remaining.clone());
    vec![Effect::StartBatch { items: remaining }]
}

/// Splits pasted text into URLs: whitespace, commas and semicolons all
/// separate entries; empties are dropped.
fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
