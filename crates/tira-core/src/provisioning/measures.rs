//! Measure specification parsing.
//!
//! One measure per line, comma-separated fields within a line. Fields are
//! kept verbatim; only a trailing carriage return is stripped from a line.

use tira_state::MeasureSpec;

/// Parse measure text into ordered measure specs.
///
/// An empty line yields an empty [`MeasureSpec`]; whether that is acceptable
/// is decided by the store.
pub fn parse_measures(text: &str) -> Vec<MeasureSpec> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| {
            if line.is_empty() {
                MeasureSpec::default()
            } else {
                MeasureSpec(line.split(',').map(str::to_string).collect())
            }
        })
        .collect()
}
