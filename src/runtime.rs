use anyhow::Result;
use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::app::{App, InputMode};
use crate::model::Mode;
use crate::net::{FetchOutcome, FetchRequest};
use crate::sort::SortKey;
use crate::ui;

const PAGE_ROWS: usize = 10;

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// What the loop should do after an input event.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    Fetch(FetchRequest),
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    rx: Receiver<FetchOutcome>,
    req_tx: Sender<FetchRequest>,
    pending: Option<FetchRequest>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    if let Some(request) = pending {
        send_request(&req_tx, request);
    }

    loop {
        while let Ok(outcome) = rx.try_recv() {
            app.apply_fetch(outcome, Utc::now());
        }

        if let Some(request) = app.tick_timer(Instant::now()) {
            send_request(&req_tx, request);
        }

        terminal.draw(|f| ui::ui(f, &mut app))?;

        if event::poll(tick_rate)? {
            let action = match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, _) => {
                    app.on_resize(width);
                    Action::None
                }
                _ => Action::None,
            };
            match action {
                Action::Quit => return Ok(()),
                Action::Fetch(request) => send_request(&req_tx, request),
                Action::None => {}
            }
        }
    }
}

fn send_request(tx: &Sender<FetchRequest>, request: FetchRequest) {
    if tx.send(request).is_err() {
        warn!("fetcher gone, request #{} dropped", request.seq);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Action {
    match app.input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('d') => switch(app, Mode::Departures),
            KeyCode::Char('a') => switch(app, Mode::Arrivals),
            KeyCode::Tab | KeyCode::BackTab => {
                let next = app.mode.toggle();
                switch(app, next)
            }
            KeyCode::Char('r') => Action::Fetch(app.begin_fetch()),
            KeyCode::Char(ch @ '1'..='7') => {
                let index = ch as usize - '1' as usize;
                if let Some(sort_key) = SortKey::from_index(index) {
                    app.click_sort(sort_key);
                }
                Action::None
            }
            KeyCode::Char('/') => {
                app.start_search();
                Action::None
            }
            KeyCode::Char('c') => {
                app.clear_search();
                Action::None
            }
            KeyCode::Char('t') => {
                app.toggle_theme();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.next_row();
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.previous_row();
                Action::None
            }
            KeyCode::PageDown => {
                app.page_down(PAGE_ROWS);
                Action::None
            }
            KeyCode::PageUp => {
                app.page_up(PAGE_ROWS);
                Action::None
            }
            _ => Action::None,
        },
        InputMode::Search => {
            match key.code {
                KeyCode::Enter => app.finish_search(),
                KeyCode::Esc => app.cancel_search(),
                KeyCode::Backspace => app.backspace_search(),
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.clear_search()
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.push_search_char(ch)
                }
                _ => {}
            }
            Action::None
        }
    }
}

fn switch(app: &mut App, mode: Mode) -> Action {
    match app.switch_mode(mode) {
        Some(request) => Action::Fetch(request),
        None => Action::None,
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.previous_row(),
        MouseEventKind::ScrollDown => app.next_row(),
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(mode) = app.tab_at(mouse.column, mouse.row) {
                return switch(app, mode);
            }
            if let Some(key) = app.header_at(mouse.column, mouse.row) {
                debug!("header click {}", key.field());
                app.click_sort(key);
            }
        }
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use super::{handle_key, handle_mouse, Action};
    use crate::app::{App, InputMode, ThemeMode};
    use crate::model::Mode;
    use crate::sort::{SortDirection, SortKey};
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn app() -> App {
        let mut app = App::new(
            "http://127.0.0.1:5001".to_string(),
            Duration::from_secs(60),
            100,
            ThemeMode::Default,
            String::new(),
        );
        let _ = app.switch_mode(Mode::Departures);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn mode_keys_issue_fetches_once() {
        let mut app = app();
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('d'))), Action::None);
        match handle_key(&mut app, key(KeyCode::Char('a'))) {
            Action::Fetch(req) => assert_eq!(req.mode, Mode::Arrivals),
            other => panic!("expected fetch, got {other:?}"),
        }
        match handle_key(&mut app, key(KeyCode::Tab)) {
            Action::Fetch(req) => assert_eq!(req.mode, Mode::Departures),
            other => panic!("expected fetch, got {other:?}"),
        }
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('q'))), Action::Quit);
    }

    #[test]
    fn number_keys_sort_columns() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('6')));
        assert_eq!(app.sort.key, SortKey::Gate);
        handle_key(&mut app, key(KeyCode::Char('6')));
        assert_eq!(app.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn search_mode_captures_text() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);
        for ch in "q1".chars() {
            assert_eq!(handle_key(&mut app, key(KeyCode::Char(ch))), Action::None);
        }
        assert_eq!(app.search, "q1");
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.search, "q");
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.search, "q");

        handle_key(&mut app, key(KeyCode::Char('/')));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        assert_eq!(app.search, "");
        handle_key(&mut app, key(KeyCode::Char('x')));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.search, "");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn clicks_hit_tabs_and_headers() {
        let mut app = app();
        app.set_tab_hitboxes(vec![(Mode::Arrivals, Rect::new(30, 1, 10, 1))]);
        app.set_header_hitboxes(vec![(SortKey::Status, Rect::new(60, 6, 8, 1))]);

        handle_mouse(&mut app, click(62, 6));
        assert_eq!(app.sort.key, SortKey::Status);
        assert_eq!(app.sort.direction, SortDirection::Asc);

        match handle_mouse(&mut app, click(31, 1)) {
            Action::Fetch(req) => assert_eq!(req.mode, Mode::Arrivals),
            other => panic!("expected fetch, got {other:?}"),
        }
        assert_eq!(handle_mouse(&mut app, click(0, 0)), Action::None);
    }
}
