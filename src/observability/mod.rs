//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Protocol violations in the menu state machine are logged at error level
//!   and never surface as errors to callers
//! - Request ID flows from the proxy handler into every hook log line

pub mod logging;
pub mod metrics;
