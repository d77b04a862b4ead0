use crate::model::Flight;

/// Reduce the board to flights matching `term`, keeping the fetched order.
///
/// Matching is a case-insensitive substring test against any flight number,
/// the primary location, the terminal and the gate. An empty term keeps
/// every flight.
pub fn filter_flights(all: &[Flight], term: &str) -> Vec<Flight> {
    if term.is_empty() {
        return all.to_vec();
    }
    let needle = term.to_lowercase();
    all.iter()
        .filter(|flight| matches(flight, &needle))
        .cloned()
        .collect()
}

fn matches(flight: &Flight, needle: &str) -> bool {
    let number_match = flight
        .flight_numbers_only
        .iter()
        .any(|number| number.to_lowercase().contains(needle));
    if number_match {
        return true;
    }
    [
        flight.location.as_deref(),
        flight.terminal.as_deref(),
        flight.gate.as_deref(),
    ]
    .iter()
    .any(|value| value.unwrap_or("").to_lowercase().contains(needle))
}
