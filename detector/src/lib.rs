//! Memory leak detection for CI runs, wrapping Apple's `leaks` tool.
//!
//! The crate keeps a strict separation between:
//!
//! - **[`core`]**: Pure, deterministic logic (leak count extraction, graph
//!   cursor, step tables). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (process execution, leak sources,
//!   report submission, config). The [`io::shell::Shell`] trait is the seam
//!   tests replace.
//!
//! [`detect`] sequences the two into the CLI's pipeline.

pub mod core;
pub mod detect;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
