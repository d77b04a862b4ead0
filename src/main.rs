mod app;
mod config;
mod error;
mod filter;
mod logging;
mod model;
mod net;
mod runtime;
mod sort;
mod ui;
mod view;

use anyhow::Result;
use std::sync::mpsc;

use app::{App, ThemeMode};
use config::parse_args;
use logging::init as init_logging;
use model::Mode;
use net::{spawn_fetcher, FetcherSettings};
use runtime::{init_terminal, restore_terminal, run_app};
use sort::{SortDirection, SortKey, SortState};
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    info!("hkg-flight-board starting");
    debug!("config path: {}", config.config_path.display());

    let (outcome_tx, outcome_rx) = mpsc::channel();
    let (req_tx, req_rx) = mpsc::channel();
    spawn_fetcher(
        FetcherSettings {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            insecure: config.insecure,
        },
        outcome_tx,
        req_rx,
    );

    let sort = SortState {
        key: SortKey::from_str(&config.sort).unwrap_or(SortKey::Time),
        direction: if config.sort_desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    };
    let mut app = App::new(
        config.base_url.clone(),
        config.refresh,
        config.mobile_breakpoint,
        ThemeMode::from_str(&config.theme),
        config.search.clone(),
    )
    .with_sort(sort);
    let initial = app.switch_mode(Mode::from_str(&config.mode).unwrap_or(Mode::Departures));

    let mut terminal = init_terminal()?;
    let res = run_app(&mut terminal, app, outcome_rx, req_tx, initial);
    restore_terminal(&mut terminal)?;

    if let Err(err) = res {
        warn!("runtime error: {err}");
        eprintln!("{err}");
    }

    info!("hkg-flight-board exited");
    Ok(())
}
