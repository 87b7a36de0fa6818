//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → request.rs (absolute-form target, hop-by-hop stripping)
//!     → host hub (defaults, Accept-Language rewrite hook)
//!     → upstream via hyper client
//!     → response (hop-by-hop stripped) to client
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::ProxyServer;
