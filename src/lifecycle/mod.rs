//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → hook hub → menu board → storage → controller
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → proxy and admin stop accepting → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the host, then the controller
//! - The first `configure` runs after listeners are bound, in the background

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_services, Services};
