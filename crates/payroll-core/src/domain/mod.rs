//! # Domain Layer (Inner Hexagon)
//!
//! Payroll record, its invariants, authorization and transition builders.
//! No I/O and no async: everything here is recomputable from its inputs.

pub mod actions;
pub mod entities;
pub mod guard;
pub mod invariants;
pub mod services;
pub mod value_objects;

pub use actions::*;
pub use entities::*;
pub use guard::*;
pub use invariants::*;
pub use services::*;
pub use value_objects::*;
