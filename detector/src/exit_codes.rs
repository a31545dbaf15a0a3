//! Stable exit codes for the `leaks-detector` CLI.

/// Run finished. Leaks may have been found and reported; per-graph analysis
/// problems that only stop the chain also end here.
pub const OK: i32 = 0;
/// A required parameter was missing, the config was invalid, or simulation,
/// capture, or analysis failed.
pub const FAILURE: i32 = 1;
