//! Alt Tong library: an Accept-Language switching forward proxy.

pub mod admin;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod http;
pub mod i18n;
pub mod lifecycle;
pub mod observability;
pub mod storage;

pub use config::AltTongConfig;
pub use controller::AltTong;
pub use error::AltTongError;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
