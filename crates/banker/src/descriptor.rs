//! State descriptor loader
//!
//! Parses the textual descriptor into a validated `SystemState`:
//!
//! ```text
//! n m
//! <n lines of m integers>   Allocation
//! <n lines of m integers>   Max
//! <1 line of m integers>    Available
//! ```
//!
//! Blank lines and `#` comments are ignored. Shape and number problems are
//! reported as [`DescriptorError`] (malformed input) with 1-based line
//! numbers; a well-formed descriptor that describes an invalid state fails
//! with the core's `StateError` instead.
//!
//! JSON descriptors (`{"allocation": .., "max": .., "available": ..}`) are
//! accepted by [`load`] when the file name ends in `.json`.

use std::path::Path;

use banker_core::{ProcessId, StateDescriptor, SystemState};

use crate::error::BankerResult;

/// Malformed descriptor or request text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// Input ended before `what` was read
    #[error("unexpected end of input: missing {what}")]
    MissingLine { what: String },

    /// A line has the wrong number of fields
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A field is not a non-negative integer
    #[error("line {line}: `{field}` is not a non-negative integer")]
    InvalidNumber { line: usize, field: String },

    /// Extra data after the Available line
    #[error("line {line}: unexpected trailing data")]
    TrailingData { line: usize },
}

/// Significant lines with their 1-based line numbers.
fn significant_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(index, raw)| {
        let line = raw.split('#').next().unwrap_or("").trim();
        (!line.is_empty()).then_some((index + 1, line))
    })
}

fn parse_fields<T: std::str::FromStr>(
    line_no: usize,
    line: &str,
    expected: usize,
) -> Result<Vec<T>, DescriptorError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != expected {
        return Err(DescriptorError::FieldCount {
            line: line_no,
            expected,
            found: fields.len(),
        });
    }

    fields
        .into_iter()
        .map(|field| {
            field.parse().map_err(|_| DescriptorError::InvalidNumber {
                line: line_no,
                field: field.to_string(),
            })
        })
        .collect()
}

/// Parse a textual descriptor into a validated state.
pub fn parse(text: &str) -> BankerResult<SystemState> {
    let mut lines = significant_lines(text);
    let mut next_line = |what: String| lines.next().ok_or(DescriptorError::MissingLine { what });

    let (line_no, header) = next_line("header `n m`".to_string())?;
    let dims: Vec<usize> = parse_fields(line_no, header, 2)?;
    let (n, m) = (dims[0], dims[1]);

    let mut read_matrix = |name: &str| -> Result<Vec<Vec<u32>>, DescriptorError> {
        (0..n)
            .map(|i| {
                let (line_no, line) = next_line(format!("{} row {}", name, i))?;
                parse_fields(line_no, line, m)
            })
            .collect()
    };
    let allocation = read_matrix("allocation")?;
    let max = read_matrix("max")?;

    let (line_no, line) = next_line("available vector".to_string())?;
    let available = parse_fields(line_no, line, m)?;

    if let Some((line, _)) = lines.next() {
        return Err(DescriptorError::TrailingData { line }.into());
    }

    Ok(SystemState::new(n, m, allocation, max, available)?)
}

/// Parse a JSON descriptor into a validated state.
pub fn parse_json(text: &str) -> BankerResult<SystemState> {
    let descriptor: StateDescriptor = serde_json::from_str(text)?;
    Ok(SystemState::try_from(descriptor)?)
}

/// Load a descriptor file; `.json` files are parsed as JSON, anything else
/// as text.
pub fn load(path: &Path) -> BankerResult<SystemState> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let state = if is_json { parse_json(&text) } else { parse(&text) }?;
    log::info!(
        "loaded {} processes x {} resources from {}",
        state.process_count(),
        state.resource_count(),
        path.display()
    );
    Ok(state)
}

/// Parse a request line: a process id followed by `resources` integers.
pub fn parse_request(
    text: &str,
    resources: usize,
) -> Result<(ProcessId, Vec<u32>), DescriptorError> {
    let (line_no, line) = significant_lines(text)
        .next()
        .ok_or_else(|| DescriptorError::MissingLine {
            what: "request".to_string(),
        })?;

    let mut fields = line.split_whitespace();
    let pid_field = fields.next().unwrap_or("");
    let pid: usize = pid_field
        .parse()
        .map_err(|_| DescriptorError::InvalidNumber {
            line: line_no,
            field: pid_field.to_string(),
        })?;

    let rest: Vec<&str> = fields.collect();
    let request = parse_fields(line_no, &rest.join(" "), resources)?;
    Ok((ProcessId(pid), request))
}

/// Render a state back into the textual descriptor format.
pub fn render(state: &SystemState) -> String {
    let row = |values: &[u32]| {
        values
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut out = format!("{} {}\n", state.process_count(), state.resource_count());
    for held in state.allocation().iter_rows() {
        out.push_str(&row(held));
        out.push('\n');
    }
    for max in state.max().iter_rows() {
        out.push_str(&row(max));
        out.push('\n');
    }
    out.push_str(&row(state.available()));
    out.push('\n');
    out
}
