use crate::model::{Flight, Mode};

pub const MISSING: &str = "-";
pub const NO_FLIGHT_NUMBER: &str = "N/A";
pub const NO_MATCHES: &str = "No flights match your search.";
pub const NO_DATA: &str = "No flight data available.";
pub const DEFAULT_STATUS_CLASS: &str = "default";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewLayout {
    Mobile,
    Desktop,
}

impl ViewLayout {
    pub fn label(self) -> &'static str {
        match self {
            ViewLayout::Mobile => "CARDS",
            ViewLayout::Desktop => "TABLE",
        }
    }
}

/// Narrow terminals get stacked cards, everything wider gets table rows.
pub fn layout_for(width: u16, breakpoint: u16) -> ViewLayout {
    if width <= breakpoint {
        ViewLayout::Mobile
    } else {
        ViewLayout::Desktop
    }
}

/// Column headings for the current mode, in board order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnLabels {
    pub location: &'static str,
    pub secondary: &'static str,
}

impl ColumnLabels {
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            location: mode.location_label(),
            secondary: mode.secondary_label(),
        }
    }

    pub fn all(&self) -> [&'static str; 7] {
        [
            "Time",
            "Flight",
            self.location,
            "Terminal",
            self.secondary,
            "Gate",
            "Status",
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightRow {
    pub time: String,
    pub flight_numbers: Vec<String>,
    pub location: String,
    pub terminal: String,
    pub secondary: String,
    pub gate: String,
    pub status: String,
    pub status_class: String,
}

impl FlightRow {
    pub fn from_flight(flight: &Flight) -> Self {
        let flight_numbers = if flight.flight_numbers_only.is_empty() {
            vec![NO_FLIGHT_NUMBER.to_string()]
        } else {
            flight.flight_numbers_only.clone()
        };
        Self {
            time: display(flight.time.as_deref()),
            flight_numbers,
            location: display(flight.location.as_deref()),
            terminal: display(flight.terminal.as_deref()),
            secondary: display(flight.location_secondary.as_deref()),
            gate: display(flight.gate.as_deref()),
            status: display(flight.status.as_deref()),
            status_class: status_class(flight.status.as_deref()),
        }
    }

    /// Single-line cells in board order; flight numbers are joined by newlines.
    pub fn cells(&self) -> [String; 7] {
        [
            self.time.clone(),
            self.flight_numbers.join("\n"),
            self.location.clone(),
            self.terminal.clone(),
            self.secondary.clone(),
            self.gate.clone(),
            self.status.clone(),
        ]
    }

    pub fn height(&self) -> u16 {
        self.flight_numbers.len().max(1) as u16
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedList {
    Message(&'static str),
    Rows {
        layout: ViewLayout,
        labels: ColumnLabels,
        rows: Vec<FlightRow>,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct RenderContext {
    pub width: u16,
    pub breakpoint: u16,
    pub mode: Mode,
    pub search_active: bool,
}

/// Rebuild the list contents from scratch for the given flights.
pub fn render_flights(flights: &[Flight], ctx: RenderContext) -> RenderedList {
    if flights.is_empty() {
        let message = if ctx.search_active { NO_MATCHES } else { NO_DATA };
        return RenderedList::Message(message);
    }
    RenderedList::Rows {
        layout: layout_for(ctx.width, ctx.breakpoint),
        labels: ColumnLabels::for_mode(ctx.mode),
        rows: flights.iter().map(FlightRow::from_flight).collect(),
    }
}

pub fn display(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => MISSING.to_string(),
    }
}

/// Lowercase, whitespace runs to one hyphen, anything but `[A-Za-z0-9_-]` dropped.
pub fn status_class(status: Option<&str>) -> String {
    let status = match status {
        Some(text) if !text.is_empty() => text,
        _ => return DEFAULT_STATUS_CLASS.to_string(),
    };
    let mut out = String::with_capacity(status.len());
    let mut in_space = false;
    for ch in status.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        }
    }
    if out.is_empty() {
        DEFAULT_STATUS_CLASS.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{
        display, layout_for, render_flights, status_class, ColumnLabels, FlightRow,
        RenderContext, RenderedList, ViewLayout, NO_DATA, NO_MATCHES,
    };
    use crate::model::{Flight, Mode};

    fn ctx(width: u16, search_active: bool) -> RenderContext {
        RenderContext {
            width,
            breakpoint: 100,
            mode: Mode::Departures,
            search_active,
        }
    }

    #[test]
    fn layout_breakpoint_is_inclusive() {
        assert_eq!(layout_for(100, 100), ViewLayout::Mobile);
        assert_eq!(layout_for(60, 100), ViewLayout::Mobile);
        assert_eq!(layout_for(101, 100), ViewLayout::Desktop);
    }

    #[test]
    fn empty_list_messages() {
        assert_eq!(render_flights(&[], ctx(120, false)), RenderedList::Message(NO_DATA));
        assert_eq!(render_flights(&[], ctx(120, true)), RenderedList::Message(NO_MATCHES));
    }

    #[test]
    fn missing_fields_render_as_dash() {
        let row = FlightRow::from_flight(&Flight {
            time: Some(String::new()),
            location: Some("Singapore".to_string()),
            ..Flight::default()
        });
        assert_eq!(row.time, "-");
        assert_eq!(row.location, "Singapore");
        assert_eq!(row.terminal, "-");
        assert_eq!(row.secondary, "-");
        assert_eq!(row.gate, "-");
        assert_eq!(row.status, "-");
        assert_eq!(row.status_class, "default");
        assert_eq!(row.flight_numbers, vec!["N/A".to_string()]);
        assert_eq!(row.height(), 1);
    }

    #[test]
    fn each_flight_number_gets_a_line() {
        let row = FlightRow::from_flight(&Flight {
            flight_numbers_only: vec!["CX501".to_string(), "BA7012".to_string()],
            ..Flight::default()
        });
        assert_eq!(row.height(), 2);
        assert_eq!(row.cells()[1], "CX501\nBA7012");
    }

    #[test]
    fn status_classes() {
        assert_eq!(status_class(Some("Gate Closed")), "gate-closed");
        assert_eq!(status_class(Some("Dep  14:05")), "dep-1405");
        assert_eq!(status_class(Some("Est at 12:30 (+1)")), "est-at-1230-1");
        assert_eq!(status_class(Some("Final_Call")), "final_call");
        assert_eq!(status_class(Some("")), "default");
        assert_eq!(status_class(None), "default");
    }

    #[test]
    fn labels_follow_mode_and_layout_follows_width() {
        let flights = vec![Flight::default()];
        let arrivals = RenderContext {
            mode: Mode::Arrivals,
            ..ctx(80, false)
        };
        match render_flights(&flights, arrivals) {
            RenderedList::Rows { layout, labels, rows } => {
                assert_eq!(layout, ViewLayout::Mobile);
                assert_eq!(labels, ColumnLabels::for_mode(Mode::Arrivals));
                assert_eq!(labels.all()[2], "Origin");
                assert_eq!(labels.all()[4], "Baggage");
                assert_eq!(rows.len(), 1);
            }
            other => panic!("expected rows, got {other:?}"),
        }
        match render_flights(&flights, ctx(140, false)) {
            RenderedList::Rows { layout, labels, .. } => {
                assert_eq!(layout, ViewLayout::Desktop);
                assert_eq!(labels.location, "Destination");
                assert_eq!(labels.secondary, "Check-in");
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn display_helper() {
        assert_eq!(display(None), "-");
        assert_eq!(display(Some("")), "-");
        assert_eq!(display(Some("T1")), "T1");
    }
}
