//! Fab telemetry feed: load a simulation workbook into per-day metric
//! series and replay them (or synthetic stand-ins) to subscribers on a
//! timer.
//!
//! The binary is a thin shell over this library so the data and stream
//! layers stay usable (and testable) without a process boundary.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod stream;
