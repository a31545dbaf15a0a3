//! Leak count extraction from `leaks` text output.
//!
//! `leaks` prints a summary line such as
//! `Process 4242: 3 leaks for 128 total leaked bytes.` The first such line
//! determines the count. Output without a summary line counts as zero leaks.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static SUMMARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) leaks for (\d+) total leaked bytes").expect("leak summary regex")
});

/// Parsed `leaks` summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakSummary {
    pub leaks: u64,
    pub leaked_bytes: u64,
}

/// Parse a single line; `None` when it is not a summary line.
pub fn parse_summary_line(line: &str) -> Option<LeakSummary> {
    let captures = SUMMARY_LINE.captures(line)?;
    // A count too large for u64 still marks the summary line; it reads as zero.
    let leaks = captures.get(1)?.as_str().parse().unwrap_or(0);
    let leaked_bytes = captures.get(2)?.as_str().parse().unwrap_or(0);
    Some(LeakSummary {
        leaks,
        leaked_bytes,
    })
}

/// Find the first summary line in `lines`.
pub fn find_summary<'a, I>(lines: I) -> Option<LeakSummary>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().find_map(parse_summary_line)
}

/// Leak count for the full analysis output.
///
/// Returns zero when no line matches. Whether that hides a parsing problem is
/// undecided, so the absence is logged at debug level rather than reported.
pub fn extract_leak_count(output: &str) -> u64 {
    match find_summary(output.lines()) {
        Some(summary) => summary.leaks,
        None => {
            debug!("no leak summary line in analysis output, treating as zero leaks");
            0
        }
    }
}
