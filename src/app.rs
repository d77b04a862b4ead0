use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use ratatui::layout::Rect;
use ratatui::widgets::TableState;
use tracing::{debug, info, warn};

use crate::filter::filter_flights;
use crate::model::{Flight, Mode};
use crate::net::{FetchOutcome, FetchRequest};
use crate::sort::{sort_flights, SortDirection, SortKey, SortState};
use crate::view::{layout_for, render_flights, ColumnLabels, RenderContext, RenderedList, ViewLayout};

/// Hong Kong has no daylight saving, so a fixed UTC+8 offset is exact.
const HKT_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Default,
    Amber,
    Monochrome,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Default => ThemeMode::Amber,
            ThemeMode::Amber => ThemeMode::Monochrome,
            ThemeMode::Monochrome => ThemeMode::Default,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Default => "DEFAULT",
            ThemeMode::Amber => "AMBER",
            ThemeMode::Monochrome => "MONO",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "amber" | "gold" => ThemeMode::Amber,
            "mono" | "monochrome" | "bw" => ThemeMode::Monochrome,
            _ => ThemeMode::Default,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusIndicator {
    Idle,
    Loading,
    /// Carries the HKT wall-clock time of the refresh.
    Success(String),
    Warning,
    Error,
}

impl StatusIndicator {
    pub fn class(&self) -> &'static str {
        match self {
            StatusIndicator::Idle => "idle",
            StatusIndicator::Loading => "loading",
            StatusIndicator::Success(_) => "success",
            StatusIndicator::Warning => "warning",
            StatusIndicator::Error => "error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            StatusIndicator::Idle => "Idle".to_string(),
            StatusIndicator::Loading => "Loading...".to_string(),
            StatusIndicator::Success(at) => format!("Updated at {at} (HKT)"),
            StatusIndicator::Warning => "No flights".to_string(),
            StatusIndicator::Error => "Error".to_string(),
        }
    }
}

/// Backend bookkeeping from the last accepted payload.
#[derive(Clone, Debug, Default)]
pub struct BatchInfo {
    pub last_updated_hkt: Option<String>,
    pub flight_count: Option<u64>,
    pub echoed_mode: Option<String>,
}

pub struct App {
    pub(crate) base_url: String,
    pub(crate) refresh: Duration,
    pub(crate) all_flights: Vec<Flight>,
    pub(crate) current_flights: Vec<Flight>,
    pub(crate) sorted_flights: Vec<Flight>,
    pub(crate) mode: Mode,
    pub(crate) sort: SortState,
    pub(crate) header_state: [Option<SortDirection>; 7],
    pub(crate) column_labels: ColumnLabels,
    pub(crate) fetch_attempts: u32,
    pub(crate) search: String,
    pub(crate) input_mode: InputMode,
    pub(crate) status: StatusIndicator,
    pub(crate) batch_info: Option<BatchInfo>,
    pub(crate) viewport_width: u16,
    pub(crate) breakpoint: u16,
    pub(crate) theme_mode: ThemeMode,
    pub(crate) table_state: TableState,
    pub(crate) header_hitboxes: Vec<(SortKey, Rect)>,
    pub(crate) tab_hitboxes: Vec<(Mode, Rect)>,
    last_seq: u64,
    next_refresh: Option<Instant>,
}

impl App {
    pub fn new(
        base_url: String,
        refresh: Duration,
        breakpoint: u16,
        theme_mode: ThemeMode,
        search: String,
    ) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        let sort = SortState::default();
        let mut app = Self {
            base_url,
            refresh,
            all_flights: Vec::new(),
            current_flights: Vec::new(),
            sorted_flights: Vec::new(),
            mode: Mode::Departures,
            sort,
            header_state: [None; 7],
            column_labels: ColumnLabels::for_mode(Mode::Departures),
            fetch_attempts: 0,
            search,
            input_mode: InputMode::Normal,
            status: StatusIndicator::Idle,
            batch_info: None,
            viewport_width: 0,
            breakpoint: breakpoint.max(1),
            theme_mode,
            table_state,
            header_hitboxes: Vec::new(),
            tab_hitboxes: Vec::new(),
            last_seq: 0,
            next_refresh: None,
        };
        app.update_header_styles();
        app
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self.sort_and_render();
        self
    }

    /// Request half of a board refresh: the caller hands the request to the
    /// fetcher and later feeds the outcome to [`App::apply_fetch`].
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.fetch_attempts = self.fetch_attempts.saturating_add(1);
        self.last_seq += 1;
        self.status = StatusIndicator::Loading;
        debug!(
            "fetch #{} issued for {} (attempt {})",
            self.last_seq,
            self.mode.endpoint(),
            self.fetch_attempts
        );
        FetchRequest {
            seq: self.last_seq,
            mode: self.mode,
        }
    }

    /// Response half of a board refresh. Returns `false` when the outcome was
    /// superseded by a newer request and dropped.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome, now: DateTime<Utc>) -> bool {
        if outcome.seq < self.last_seq {
            debug!(
                "dropping stale response #{} for {} (latest #{})",
                outcome.seq,
                outcome.mode.endpoint(),
                self.last_seq
            );
            return false;
        }

        match outcome.result {
            Ok(batch) => {
                info!(
                    "{} refreshed: {} flights (version {})",
                    outcome.mode.endpoint(),
                    batch.flights.len(),
                    batch.version
                );
                if let Some(echoed) = batch.mode.as_deref() {
                    if !echoed.eq_ignore_ascii_case(outcome.mode.endpoint()) {
                        warn!(
                            "requested {} but backend answered for {echoed}",
                            outcome.mode.endpoint()
                        );
                    }
                }
                self.all_flights = batch.flights;
                self.batch_info = Some(BatchInfo {
                    last_updated_hkt: batch.last_updated_hkt,
                    flight_count: batch.flight_count,
                    echoed_mode: batch.mode,
                });
                self.filter_and_render();
                self.status = if self.all_flights.is_empty() {
                    StatusIndicator::Warning
                } else {
                    StatusIndicator::Success(hkt_clock(now))
                };
            }
            Err(err) => {
                warn!("fetch error ({}): {err}", outcome.mode.endpoint());
                self.all_flights.clear();
                self.current_flights.clear();
                self.sorted_flights.clear();
                self.batch_info = None;
                self.status = StatusIndicator::Error;
            }
        }
        true
    }

    /// True when the backend labelled the current board as the other mode.
    pub fn mode_mismatch(&self) -> bool {
        self.batch_info
            .as_ref()
            .and_then(|info| info.echoed_mode.as_deref())
            .map(|echoed| !echoed.eq_ignore_ascii_case(self.mode.endpoint()))
            .unwrap_or(false)
    }

    pub fn filter_and_render(&mut self) {
        self.current_flights = filter_flights(&self.all_flights, &self.search);
        debug!(
            "filter len={} kept {}/{}",
            self.search.len(),
            self.current_flights.len(),
            self.all_flights.len()
        );
        self.sort_and_render();
    }

    pub fn sort_and_render(&mut self) {
        self.sorted_flights = sort_flights(&self.current_flights, self.sort);
        self.clamp_selection();
        self.update_header_styles();
    }

    fn update_header_styles(&mut self) {
        for key in SortKey::ALL {
            self.header_state[key.index()] = if self.sort.key == key {
                Some(self.sort.direction)
            } else {
                None
            };
        }
    }

    pub fn header_class(&self, key: SortKey) -> Option<&'static str> {
        self.sort.header_class(key)
    }

    /// Returns the fetch to issue, or `None` when re-selecting the active
    /// mode after it has already fetched.
    pub fn switch_mode(&mut self, new_mode: Mode) -> Option<FetchRequest> {
        if new_mode == self.mode && self.fetch_attempts > 0 {
            debug!("mode {} already active", new_mode.endpoint());
            return None;
        }
        info!("switching to {}", new_mode.endpoint());
        self.mode = new_mode;
        self.column_labels = ColumnLabels::for_mode(new_mode);
        self.fetch_attempts = 0;
        Some(self.begin_fetch())
    }

    pub fn click_sort(&mut self, key: SortKey) {
        self.sort.click(key);
        debug!("sort -> {} {}", key.field(), self.sort.direction.label());
        self.sort_and_render();
    }

    pub fn refresh_due(&self, now: Instant) -> bool {
        self.next_refresh.map(|due| now >= due).unwrap_or(false)
    }

    /// Periodic refresh, independent of user activity and mode switches.
    /// The first call arms the timer.
    pub fn tick_timer(&mut self, now: Instant) -> Option<FetchRequest> {
        let due = match self.next_refresh {
            None => {
                self.next_refresh = Some(now + self.refresh);
                return None;
            }
            Some(due) => due,
        };
        if !self.refresh_due(now) {
            return None;
        }
        let mut next = due + self.refresh;
        if next <= now {
            next = now + self.refresh;
        }
        self.next_refresh = Some(next);
        Some(self.begin_fetch())
    }

    pub fn on_resize(&mut self, width: u16) {
        if width == self.viewport_width {
            return;
        }
        let before = layout_for(self.viewport_width, self.breakpoint);
        self.viewport_width = width;
        let after = self.layout();
        if before != after {
            debug!("layout -> {} at width {width}", after.label());
        }
    }

    pub fn layout(&self) -> ViewLayout {
        layout_for(self.viewport_width, self.breakpoint)
    }

    pub fn rendered(&self) -> RenderedList {
        render_flights(
            &self.sorted_flights,
            RenderContext {
                width: self.viewport_width,
                breakpoint: self.breakpoint,
                mode: self.mode,
                search_active: !self.search.is_empty(),
            },
        )
    }

    pub fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggle();
        debug!("theme -> {}", self.theme_mode.label());
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
        debug!("search edit start");
    }

    pub fn finish_search(&mut self) {
        self.input_mode = InputMode::Normal;
        debug!("search kept len={}", self.search.len());
    }

    pub fn cancel_search(&mut self) {
        self.input_mode = InputMode::Normal;
        self.clear_search();
    }

    pub fn clear_search(&mut self) {
        if self.search.is_empty() {
            return;
        }
        self.search.clear();
        self.filter_and_render();
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.filter_and_render();
    }

    pub fn backspace_search(&mut self) {
        if self.search.pop().is_some() {
            self.filter_and_render();
        }
    }

    pub fn selected(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    pub fn next_row(&mut self) {
        self.move_selection(1);
    }

    pub fn previous_row(&mut self) {
        self.move_selection(-1);
    }

    pub fn page_down(&mut self, page: usize) {
        self.move_selection(page.max(1) as isize);
    }

    pub fn page_up(&mut self, page: usize) {
        self.move_selection(-(page.max(1) as isize));
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.sorted_flights.len();
        if len == 0 {
            self.table_state.select(Some(0));
            return;
        }
        let current = self.selected() as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn clamp_selection(&mut self) {
        let len = self.sorted_flights.len();
        let selected = self.selected();
        if len == 0 {
            self.table_state.select(Some(0));
        } else if selected >= len {
            self.table_state.select(Some(len - 1));
        }
    }

    pub fn set_header_hitboxes(&mut self, hitboxes: Vec<(SortKey, Rect)>) {
        self.header_hitboxes = hitboxes;
    }

    pub fn set_tab_hitboxes(&mut self, hitboxes: Vec<(Mode, Rect)>) {
        self.tab_hitboxes = hitboxes;
    }

    pub fn header_at(&self, x: u16, y: u16) -> Option<SortKey> {
        self.header_hitboxes
            .iter()
            .find(|(_, rect)| rect_contains(*rect, x, y))
            .map(|(key, _)| *key)
    }

    pub fn tab_at(&self, x: u16, y: u16) -> Option<Mode> {
        self.tab_hitboxes
            .iter()
            .find(|(_, rect)| rect_contains(*rect, x, y))
            .map(|(mode, _)| *mode)
    }
}

fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

pub fn hkt_clock(now: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(HKT_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).format("%H:%M:%S").to_string(),
        None => now.format("%H:%M:%S").to_string(),
    }
}
