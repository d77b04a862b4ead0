use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::Flight;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Time,
    FlightNumbers,
    Location,
    Terminal,
    LocationSecondary,
    Gate,
    Status,
}

impl SortKey {
    /// Columns in board order.
    pub const ALL: [SortKey; 7] = [
        SortKey::Time,
        SortKey::FlightNumbers,
        SortKey::Location,
        SortKey::Terminal,
        SortKey::LocationSecondary,
        SortKey::Gate,
        SortKey::Status,
    ];

    pub fn index(self) -> usize {
        match self {
            SortKey::Time => 0,
            SortKey::FlightNumbers => 1,
            SortKey::Location => 2,
            SortKey::Terminal => 3,
            SortKey::LocationSecondary => 4,
            SortKey::Gate => 5,
            SortKey::Status => 6,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Field name as it appears in the JSON payload.
    pub fn field(self) -> &'static str {
        match self {
            SortKey::Time => "time",
            SortKey::FlightNumbers => "flight_numbers_only",
            SortKey::Location => "location",
            SortKey::Terminal => "terminal",
            SortKey::LocationSecondary => "location_secondary",
            SortKey::Gate => "gate",
            SortKey::Status => "status",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.field() == value.trim())
    }

    fn value(self, flight: &Flight) -> &str {
        let value = match self {
            SortKey::Time => flight.time.as_deref(),
            SortKey::FlightNumbers => flight.flight_numbers_only.first().map(String::as_str),
            SortKey::Location => flight.location.as_deref(),
            SortKey::Terminal => flight.terminal.as_deref(),
            SortKey::LocationSecondary => flight.location_secondary.as_deref(),
            SortKey::Gate => flight.gate.as_deref(),
            SortKey::Status => flight.status.as_deref(),
        };
        value.unwrap_or("")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reverse(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Time,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    /// Header click: same column flips direction, a new column starts ascending.
    pub fn click(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.reverse();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn header_class(&self, key: SortKey) -> Option<&'static str> {
        if self.key != key {
            return None;
        }
        Some(match self.direction {
            SortDirection::Asc => "sorted-asc",
            SortDirection::Desc => "sorted-desc",
        })
    }

    pub fn compare(&self, a: &Flight, b: &Flight) -> Ordering {
        let val_a = self.key.value(a);
        let val_b = self.key.value(b);
        match (is_na(val_a), is_na(val_b)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = natural_cmp(val_a, val_b);
                match self.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }
        }
    }
}

/// Returns a sorted copy; `flights` is left as filtered.
pub fn sort_flights(flights: &[Flight], state: SortState) -> Vec<Flight> {
    let mut sorted = flights.to_vec();
    sorted.sort_by(|a, b| state.compare(a, b));
    sorted
}

fn is_na(value: &str) -> bool {
    value.is_empty() || value == "-"
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
    Number(&'a str),
    Char(char),
}

impl Token<'_> {
    /// Punctuation and spaces, then numbers, then letters.
    fn rank(&self) -> u8 {
        match self {
            Token::Number(_) => 1,
            Token::Char(c) if c.is_alphanumeric() => 2,
            Token::Char(_) => 0,
        }
    }

    fn collate(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Token::Char(a), Token::Char(b)) => a.cmp(b),
            _ => Ordering::Equal,
        })
    }
}

fn tokens(value: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut rest = value;
    while let Some(ch) = rest.chars().next() {
        if ch.is_ascii_digit() {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            out.push(Token::Number(rest[..end].trim_start_matches('0')));
            rest = &rest[end..];
        } else {
            out.extend(ch.to_lowercase().map(Token::Char));
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// Canonical decomposition with the combining marks dropped, so "É" collates
/// as "E".
fn fold_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Unaccented sorts before accented when strings differ only in accents.
fn cmp_accents(a: &str, b: &str) -> Ordering {
    let left: Vec<char> = a.nfd().flat_map(char::to_lowercase).collect();
    let right: Vec<char> = b.nfd().flat_map(char::to_lowercase).collect();
    for (ca, cb) in left.iter().zip(right.iter()) {
        if ca != cb {
            return match (is_combining_mark(*ca), is_combining_mark(*cb)) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => ca.cmp(cb),
            };
        }
    }
    left.len().cmp(&right.len())
}

/// Lowercase sorts before uppercase when strings differ only in case.
fn cmp_case(a: &str, b: &str) -> Ordering {
    for (ca, cb) in a.nfd().zip(b.nfd()) {
        if ca != cb {
            return match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            };
        }
    }
    a.nfd().count().cmp(&b.nfd().count())
}

/// Locale-style comparison with numeric runs compared by value, so "2" < "10"
/// and "CX9" < "CX10". Letters compare by base letter first, ignoring case
/// and accents, so "Édimbourg" lands between "Dubai" and "Frankfurt".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let folded_a = fold_accents(a);
    let folded_b = fold_accents(b);
    let left = tokens(&folded_a);
    let right = tokens(&folded_b);
    for (ta, tb) in left.iter().zip(right.iter()) {
        let ord = ta.collate(tb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len()
        .cmp(&right.len())
        .then_with(|| cmp_accents(a, b))
        .then_with(|| cmp_case(a, b))
}
