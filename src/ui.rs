use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::{App, InputMode, ThemeMode};
use crate::model::Mode;
use crate::sort::SortKey;
use crate::view::{ColumnLabels, FlightRow, RenderedList, ViewLayout};

const SEARCH_PLACEHOLDER: &str = "Search flight, destination/origin, terminal or gate";
const HEADER_TITLE: &str = "HKG FLIGHT BOARD";
const SEPARATOR: &str = " | ";
const COLUMN_SPACING: u16 = 1;

struct Theme {
    accent: Color,
    ok: Color,
    warn: Color,
    danger: Color,
    dim: Color,
    text: Color,
    highlight_fg: Color,
    highlight_bg: Color,
    row_even_bg: Color,
    row_odd_bg: Color,
    header_bg: Color,
    panel_bg: Color,
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    app.on_resize(size.width);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);
    render_board(f, chunks[2], app);
    render_footer(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = theme(app.theme_mode);
    let inner_x = area.x.saturating_add(1);
    let inner_y = area.y.saturating_add(1);

    let mut spans = vec![
        Span::styled(
            HEADER_TITLE,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(SEPARATOR),
    ];

    let mut x = inner_x + text_len(HEADER_TITLE) as u16 + text_len(SEPARATOR) as u16;
    let mut tabs = Vec::with_capacity(2);
    for mode in [Mode::Departures, Mode::Arrivals] {
        let label = tab_label(mode);
        let width = text_len(&label) as u16;
        tabs.push((mode, Rect::new(x, inner_y, width, 1)));
        let style = if mode == app.mode {
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
        x = x.saturating_add(width + 1);
    }
    app.set_tab_hitboxes(tabs);

    spans.push(Span::raw(SEPARATOR));
    spans.push(Span::styled(
        format!("[{}]", app.status.message()),
        Style::default()
            .fg(status_badge_color(app.status.class(), &theme))
            .add_modifier(Modifier::BOLD),
    ));

    let data_time = app
        .batch_info
        .as_ref()
        .and_then(|info| info.last_updated_hkt.clone())
        .unwrap_or_else(|| "--".to_string());
    let count = app
        .batch_info
        .as_ref()
        .map(|info| {
            info.flight_count
                .unwrap_or(app.all_flights.len() as u64)
                .to_string()
        })
        .unwrap_or_else(|| "--".to_string());

    let mut bottom = vec![
        Span::raw(format!(
            "SORT {} {}",
            app.column_labels.all()[app.sort.key.index()].to_ascii_uppercase(),
            app.sort.direction.arrow()
        )),
        Span::raw(SEPARATOR),
        Span::raw(format!(
            "SHOWN {}/{}",
            app.sorted_flights.len(),
            app.all_flights.len()
        )),
        Span::raw(SEPARATOR),
        Span::raw(format!("FLIGHTS {count}")),
        Span::raw(SEPARATOR),
        Span::raw(format!("DATA {data_time}")),
        Span::raw(SEPARATOR),
        Span::raw(format!("VIEW {}", app.layout().label())),
        Span::raw(SEPARATOR),
        Span::raw(format!("THEME {}", app.theme_mode.label())),
    ];
    if app.mode_mismatch() {
        bottom.push(Span::raw(SEPARATOR));
        bottom.push(Span::styled(
            "BOARD MISMATCH",
            Style::default().fg(theme.warn).add_modifier(Modifier::BOLD),
        ));
    }
    let line_bottom = Line::from(bottom);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .style(Style::default().bg(theme.panel_bg));
    let header = Paragraph::new(vec![Line::from(spans), line_bottom])
        .block(block)
        .style(Style::default().fg(theme.text));
    f.render_widget(header, area);
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let editing = app.input_mode == InputMode::Search;
    let label_style = if editing {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.dim)
    };

    let mut spans = vec![Span::styled(" SEARCH ", label_style)];
    if app.search.is_empty() && !editing {
        spans.push(Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(theme.dim)));
    } else {
        spans.push(Span::styled(
            app.search.clone(),
            Style::default().fg(theme.text),
        ));
        if editing {
            spans.push(Span::styled("_", Style::default().fg(theme.accent)));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_board(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = theme(app.theme_mode);
    let title = format!("{} {}", app.mode.label(), app.layout().label());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .title(title)
        .style(Style::default().bg(theme.panel_bg));

    match app.rendered() {
        RenderedList::Message(message) => {
            app.set_header_hitboxes(Vec::new());
            let inner_height = area.height.saturating_sub(2);
            let mut lines = Vec::new();
            for _ in 0..inner_height / 2 {
                lines.push(Line::raw(""));
            }
            lines.push(Line::styled(message, Style::default().fg(theme.dim)));
            let paragraph = Paragraph::new(lines)
                .block(block)
                .alignment(Alignment::Center);
            f.render_widget(paragraph, area);
        }
        RenderedList::Rows {
            layout: ViewLayout::Desktop,
            labels,
            rows,
        } => render_table(f, area, block, app, labels, &rows),
        RenderedList::Rows {
            layout: ViewLayout::Mobile,
            labels,
            rows,
        } => render_cards(f, area, block, app, labels, &rows),
    }
}

fn render_table(
    f: &mut Frame,
    area: Rect,
    block: Block,
    app: &mut App,
    labels: ColumnLabels,
    rows: &[FlightRow],
) {
    let theme = theme(app.theme_mode);
    let available = area.width.saturating_sub(2);
    let header_labels: Vec<String> = SortKey::ALL
        .iter()
        .map(|key| header_label(labels.all()[key.index()], app, *key))
        .collect();
    let widths = column_widths(&header_labels, rows, available);

    let mut hitboxes = Vec::with_capacity(widths.len());
    let mut x = area.x.saturating_add(1);
    let y = area.y.saturating_add(1);
    for (key, width) in SortKey::ALL.iter().zip(widths.iter()) {
        hitboxes.push((*key, Rect::new(x, y, *width, 1)));
        x = x.saturating_add(width + COLUMN_SPACING);
    }
    app.set_header_hitboxes(hitboxes);

    let header_cells = SortKey::ALL.iter().map(|key| {
        let mut style = Style::default()
            .fg(theme.accent)
            .bg(theme.header_bg)
            .add_modifier(Modifier::BOLD);
        if app.header_class(*key).is_some() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(header_labels[key.index()].clone()).style(style)
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(theme.header_bg))
        .height(1);

    let body = rows.iter().enumerate().map(|(i, row)| {
        let style = if i % 2 == 0 {
            Style::default().bg(theme.row_even_bg).fg(theme.text)
        } else {
            Style::default().bg(theme.row_odd_bg).fg(theme.text)
        };
        let [time, flights, location, terminal, secondary, gate, status] = row.cells();
        let cells = vec![
            Cell::from(time),
            Cell::from(flights).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(location),
            Cell::from(terminal),
            Cell::from(secondary),
            Cell::from(gate),
            Cell::from(status)
                .style(Style::default().fg(status_color(&row.status_class, &theme))),
        ];
        Row::new(cells).style(style).height(row.height())
    });

    let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w)).collect();
    let table = Table::new(body, constraints)
        .header(header)
        .block(block)
        .column_spacing(COLUMN_SPACING)
        .style(Style::default().bg(theme.panel_bg))
        .row_highlight_style(
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        );
    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_cards(
    f: &mut Frame,
    area: Rect,
    block: Block,
    app: &mut App,
    labels: ColumnLabels,
    rows: &[FlightRow],
) {
    let theme = theme(app.theme_mode);
    let inner = block.inner(area);
    f.render_widget(block, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    // Cards have no column headers, so the first line doubles as a sort strip.
    // It never wraps: labels past the right edge are cut and get no hitbox.
    let strip_area = chunks[0];
    let right = strip_area.right();
    let mut strip = vec![Span::styled("SORT ", Style::default().fg(theme.dim))];
    let mut hitboxes = Vec::with_capacity(SortKey::ALL.len());
    let mut x = strip_area.x.saturating_add(5);
    for key in SortKey::ALL {
        let label = header_label(labels.all()[key.index()], app, key);
        let width = u16::try_from(text_len(&label)).unwrap_or(u16::MAX);
        if x < right {
            let visible = width.min(right - x);
            hitboxes.push((key, Rect::new(x, strip_area.y, visible, 1)));
        }
        let style = if app.header_state[key.index()].is_some() {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim)
        };
        strip.push(Span::styled(label, style));
        strip.push(Span::raw(" "));
        x = x.saturating_add(width).saturating_add(1);
    }
    app.set_header_hitboxes(hitboxes);
    f.render_widget(
        Paragraph::new(Line::from(strip)),
        Rect::new(strip_area.x, strip_area.y, strip_area.width, strip_area.height.min(1)),
    );

    let mut lines = Vec::new();
    for (i, row) in rows.iter().enumerate().skip(app.selected()) {
        let title_style = if i == app.selected() {
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        };
        lines.extend(card_lines(row, labels, &theme, title_style));
        lines.push(Line::raw(""));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[1]);
}

fn card_lines(
    row: &FlightRow,
    labels: ColumnLabels,
    theme: &Theme,
    title_style: Style,
) -> Vec<Line<'static>> {
    let key_style = Style::default().fg(theme.dim);
    let mut lines = vec![Line::from(vec![
        Span::styled(format!(" {} ", row.time), title_style),
        Span::raw("  "),
        Span::styled(
            row.flight_numbers.join(" / "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    lines.push(Line::from(vec![
        Span::styled(format!("{}: ", labels.location), key_style),
        Span::raw(row.location.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Terminal: ", key_style),
        Span::raw(row.terminal.clone()),
        Span::raw("  "),
        Span::styled(format!("{}: ", labels.secondary), key_style),
        Span::raw(row.secondary.clone()),
        Span::raw("  "),
        Span::styled("Gate: ", key_style),
        Span::raw(row.gate.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Status: ", key_style),
        Span::styled(
            row.status.clone(),
            Style::default().fg(status_color(&row.status_class, theme)),
        ),
    ]));
    lines
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let help = match app.input_mode {
        InputMode::Search => "type to filter  Enter keep  Esc clear  Ctrl+U erase".to_string(),
        InputMode::Normal => format!(
            "q quit  d/a/Tab mode  1-7 sort  / search  arrows scroll  t theme  REF {}s  SRC {}",
            app.refresh.as_secs(),
            short_source(&app.base_url)
        ),
    };
    let footer = Paragraph::new(Line::styled(help, Style::default().fg(theme.dim)));
    f.render_widget(footer, area);
}

fn tab_label(mode: Mode) -> String {
    format!(" {} ", mode.label())
}

fn header_label(label: &str, app: &App, key: SortKey) -> String {
    match app.header_state[key.index()] {
        Some(direction) => format!("{label} {}", direction.arrow()),
        None => label.to_string(),
    }
}

/// Natural width per column, then the location and status columns give up
/// space first when the terminal is too narrow. Widths are summed in `usize`
/// so very long cells cannot wrap the arithmetic.
fn column_widths(labels: &[String], rows: &[FlightRow], available: u16) -> Vec<u16> {
    let mut widths: Vec<usize> = labels.iter().map(|l| text_len(l)).collect();
    for row in rows {
        for (i, cell) in row.cells().iter().enumerate() {
            let longest = cell.lines().map(text_len).max().unwrap_or(0);
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(longest);
            }
        }
    }

    let available = usize::from(available);
    let spacing = usize::from(COLUMN_SPACING) * widths.len().saturating_sub(1);
    let total = widths.iter().sum::<usize>() + spacing;
    if total <= available {
        if let Some(location) = widths.get_mut(2) {
            *location += available - total;
        }
    } else {
        let mut overflow = total - available;
        for (index, floor) in [(2usize, 10usize), (6, 8), (4, 6), (3, 4)] {
            if overflow == 0 {
                break;
            }
            if let Some(width) = widths.get_mut(index) {
                let give = width.saturating_sub(floor).min(overflow);
                *width -= give;
                overflow -= give;
            }
        }
    }
    widths
        .into_iter()
        .map(|width| u16::try_from(width).unwrap_or(u16::MAX))
        .collect()
}

fn status_color(class: &str, theme: &Theme) -> Color {
    if class.contains("cancel") {
        theme.danger
    } else if class.contains("delay") || class.contains("est") {
        theme.warn
    } else if class.starts_with("dep")
        || class.contains("arrived")
        || class.contains("landed")
        || class.starts_with("at-gate")
    {
        theme.ok
    } else if class.contains("boarding") || class.contains("final") || class.contains("gate-closed")
    {
        theme.accent
    } else {
        theme.text
    }
}

fn status_badge_color(class: &str, theme: &Theme) -> Color {
    match class {
        "loading" => theme.accent,
        "success" => theme.ok,
        "warning" => theme.warn,
        "error" => theme.danger,
        _ => theme.dim,
    }
}

fn short_source(url: &str) -> String {
    let mut text = url.trim();
    if let Some(pos) = text.find("://") {
        text = &text[pos + 3..];
    }
    let host = text.split('/').next().unwrap_or("");
    if host.is_empty() {
        "--".to_string()
    } else {
        host.chars().take(24).collect()
    }
}

fn text_len(value: &str) -> usize {
    value.chars().count()
}

fn theme(mode: ThemeMode) -> Theme {
    match mode {
        ThemeMode::Default => Theme {
            accent: Color::Yellow,
            ok: Color::Green,
            warn: Color::LightYellow,
            danger: Color::Red,
            dim: Color::DarkGray,
            text: Color::White,
            highlight_fg: Color::Black,
            highlight_bg: Color::Rgb(200, 200, 200),
            row_even_bg: Color::Rgb(20, 20, 24),
            row_odd_bg: Color::Rgb(12, 12, 16),
            header_bg: Color::Rgb(24, 24, 28),
            panel_bg: Color::Rgb(18, 18, 22),
        },
        ThemeMode::Amber => Theme {
            accent: Color::Rgb(255, 191, 0),
            ok: Color::Rgb(200, 230, 120),
            warn: Color::Rgb(255, 220, 120),
            danger: Color::LightRed,
            dim: Color::Rgb(140, 110, 40),
            text: Color::Rgb(255, 210, 120),
            highlight_fg: Color::Black,
            highlight_bg: Color::Rgb(255, 220, 120),
            row_even_bg: Color::Rgb(28, 22, 12),
            row_odd_bg: Color::Rgb(20, 16, 10),
            header_bg: Color::Rgb(32, 24, 14),
            panel_bg: Color::Rgb(24, 18, 10),
        },
        ThemeMode::Monochrome => Theme {
            accent: Color::White,
            ok: Color::White,
            warn: Color::Gray,
            danger: Color::White,
            dim: Color::DarkGray,
            text: Color::Gray,
            highlight_fg: Color::Black,
            highlight_bg: Color::White,
            row_even_bg: Color::Reset,
            row_odd_bg: Color::Reset,
            header_bg: Color::Reset,
            panel_bg: Color::Reset,
        },
    }
}
