//! Tolerant parsers for raw device command output
//!
//! Device CLI output is a hostile input: asynchronous syslog lines,
//! pagination markers, and the trailing prompt all interleave with the
//! table being parsed. The scanner here locates a table by its header,
//! then extracts rows line by line, silently skipping anything that does
//! not match. A missing header is not an error — it means the command
//! produced no data on this device (e.g. an unsupported feature) and
//! yields an empty result.

pub mod tables;

use regex::Regex;
use std::sync::LazyLock;

/// Declarative description of one tabular command output.
pub struct TableSpec {
    /// Predicate identifying the header line.
    pub header: fn(&str) -> bool,
    /// Whether a dash-run separator line follows the header; rows start
    /// after it.
    pub separator: bool,
    /// Stop once a line with this prefix appears (e.g. "Total ...").
    pub stop_prefix: Option<&'static str>,
    /// Stop after this many consecutive blank lines once data has started.
    pub stop_on_blank_run: Option<usize>,
    /// Row extraction pattern with named fields.
    pub row: &'static LazyLock<Regex>,
}

/// Asynchronous log lines and pagination markers that may appear anywhere.
pub fn is_noise(stripped: &str) -> bool {
    stripped.starts_with('%')
        || stripped.starts_with('*')
        || stripped.starts_with('^')
        || stripped.starts_with("--More--")
}

/// A privileged-exec prompt line terminates the table.
pub fn is_prompt(stripped: &str) -> bool {
    stripped.ends_with('#')
}

/// Scan `raw` for the table described by `spec` and return the captures of
/// every matching row. Returns an empty vector when the header (or a
/// required separator) is absent.
pub fn scan_rows<'t>(raw: &'t str, spec: &TableSpec) -> Vec<regex::Captures<'t>> {
    let lines: Vec<&str> = raw.lines().collect();

    let Some(header_idx) = lines.iter().position(|l| (spec.header)(l)) else {
        return Vec::new();
    };

    let mut start = header_idx + 1;
    if spec.separator {
        let Some(sep_idx) = lines[start..]
            .iter()
            .position(|l| l.trim().starts_with("----"))
        else {
            return Vec::new();
        };
        start += sep_idx + 1;
    }

    let mut rows = Vec::new();
    let mut data_started = false;
    let mut blank_run = 0usize;

    for line in &lines[start..] {
        let stripped = line.trim();

        if stripped.is_empty() {
            if data_started {
                blank_run += 1;
                if let Some(limit) = spec.stop_on_blank_run {
                    if blank_run >= limit {
                        break;
                    }
                }
            }
            continue;
        }
        blank_run = 0;

        if is_prompt(stripped) {
            break;
        }
        if let Some(prefix) = spec.stop_prefix {
            if stripped.starts_with(prefix) {
                break;
            }
        }
        if is_noise(stripped) {
            continue;
        }

        if let Some(caps) = spec.row.captures(line) {
            data_started = true;
            rows.push(caps);
        }
        // Non-matching lines are silently skipped (tolerant parsing).
    }

    rows
}
