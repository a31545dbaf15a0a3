//! Deterministic, pure logic shared by the detector pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod cursor;
pub mod leak_count;
pub mod types;
