//! I/O helpers for the detector pipeline.

pub mod config;
pub mod process;
pub mod report;
pub mod shell;
pub mod source;
