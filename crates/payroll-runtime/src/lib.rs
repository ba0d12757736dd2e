//! # Payroll Runtime Library
//!
//! Wiring and session replay for the payroll engine. The main entry point is
//! the `main.rs` binary; this library exposes the runner for testing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;

pub use session::{Session, SessionError, SessionRunner, Step, StepOp, StepOutcome, StepResult};
