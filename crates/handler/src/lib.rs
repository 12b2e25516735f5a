//! End-to-end request pipeline.
//!
//! Wires the validation runner and the channel runners into a single
//! short-circuiting pass over one invocation envelope.

pub mod app;

pub use app::{App, Capabilities, DoctorReport, DoctorStatus, Stage, handle_event};
