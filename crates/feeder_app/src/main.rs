mod cli;
mod config;
mod effects;
mod ingest;
mod logging;
mod persistence;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use feeder_core::{update, AppState, AppViewModel, Msg, SessionState};
use feeder_engine::{bridge_probes, EngineHandle, HttpBridge};

use crate::cli::Cli;
use crate::config::FeederConfig;
use crate::effects::EffectRunner;
use crate::logging::LogDestination;
use crate::persistence::MarkerStore;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(if cli.verbose {
        LogDestination::Both
    } else {
        LogDestination::File
    });

    let mut config = FeederConfig::load(&cli.config)?;
    if let Some(bridge) = cli.bridge {
        config.bridge_url = bridge;
    }
    if let Some(column) = cli.column {
        config.url_column = column;
    }
    let state_dir = cli
        .state_dir
        .unwrap_or_else(|| PathBuf::from(&config.state_dir));

    let store = Arc::new(MarkerStore::load(&state_dir));
    let engine_config = config.engine_config();
    let bridge = Arc::new(
        HttpBridge::new(&engine_config.bridge)
            .map_err(|err| anyhow!("automation bridge client: {err}"))?,
    );
    let engine = EngineHandle::new(
        engine_config,
        bridge_probes(bridge.clone()),
        bridge,
        store.clone(),
    );
    let runner = EffectRunner::new(engine);

    let mut state = AppState::new();
    let mut pending: VecDeque<Msg> = VecDeque::new();
    pending.push_back(Msg::RestoreCompletedItems(store.completed_snapshot()));

    let text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading input {}", cli.input.display()))?;
    if cli.csv {
        let items = ingest::parse_csv(&text, &config.url_column)?;
        pending.push_back(Msg::ItemsSubmitted(items));
    } else {
        pending.push_back(Msg::InputChanged(text));
        pending.push_back(Msg::SubmitClicked);
    }

    // Enter requests a cooperative stop; the in-flight item still finishes.
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    thread::spawn(move || {
        let mut line = String::new();
        while std::io::stdin().read_line(&mut line).is_ok() {
            if stop_tx.send(()).is_err() {
                break;
            }
            line.clear();
        }
    });
    println!("Press Enter to stop after the current item.");

    loop {
        pending.extend(runner.poll());
        if stop_rx.try_recv().is_ok() {
            pending.push_back(Msg::StopClicked);
        }

        while let Some(msg) = pending.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;
            pending.extend(runner.enqueue(effects));
        }

        if state.consume_dirty() {
            render(&state.view());
        }

        if state.view().session == SessionState::Idle && !runner.is_running() {
            // One final drain so the terminal summary is never missed.
            let late = runner.poll();
            if late.is_empty() {
                break;
            }
            pending.extend(late);
            continue;
        }

        thread::sleep(Duration::from_millis(50));
    }

    Ok(())
}

fn render(view: &AppViewModel) {
    if let Some(status) = &view.status {
        if status.is_error {
            eprintln!("{}", status.text);
        } else {
            println!("{}", status.text);
        }
    }
}
