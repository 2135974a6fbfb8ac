//! CLI command implementations.

pub mod blocks;
pub mod paging;
pub mod run;
pub mod schedule;
pub mod segments;

/// A process given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub id: String,
    pub burst: u64,
    pub arrival: u64,
}

/// Parses `NAME:SIZE`.
pub fn parse_named_size(s: &str) -> Result<(String, u64), String> {
    let (name, size) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:SIZE, got '{s}'"))?;
    let size = size
        .trim()
        .parse()
        .map_err(|_| format!("invalid size in '{s}'"))?;
    Ok((name.trim().to_string(), size))
}

/// Parses `ID:BURST[:ARRIVAL]`.
pub fn parse_process(s: &str) -> Result<ProcessSpec, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let number = |field: &str, value: &str| {
        value
            .parse::<u64>()
            .map_err(|_| format!("invalid {field} in '{s}'"))
    };

    match parts.as_slice() {
        [id, burst] => Ok(ProcessSpec {
            id: (*id).to_string(),
            burst: number("burst time", burst)?,
            arrival: 0,
        }),
        [id, burst, arrival] => Ok(ProcessSpec {
            id: (*id).to_string(),
            burst: number("burst time", burst)?,
            arrival: number("arrival time", arrival)?,
        }),
        _ => Err(format!("expected ID:BURST[:ARRIVAL], got '{s}'")),
    }
}
