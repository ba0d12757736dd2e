//! # Adapters Layer (Outer Hexagon)
//!
//! In-process implementations of the driven ports.

pub mod clock;
pub mod directory;
pub mod memory_ledger;

pub use clock::ManualClock;
pub use directory::DirectoryResolver;
pub use memory_ledger::InMemoryLedger;
