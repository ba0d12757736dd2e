//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `PayrollApi`
//! - **Driven Ports (Outbound)**: `LedgerClient`, `IdentityResolver`, `TimeSource`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
