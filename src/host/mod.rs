//! Host collaborators.
//!
//! # Data Flow
//! ```text
//! proxied request / probe
//!     → webrequest.rs (defaults, hooks filtered by pattern.rs)
//!     → upstream (hyper client) unless a hook cancelled it
//!
//! admin API click
//!     → menu.rs (MenuBoard moves selection, emits ClickEvent)
//!     → controller dispatches to the registered click handler
//! ```

pub mod menu;
pub mod pattern;
pub mod webrequest;

pub use menu::{ClickEvent, ItemType, ItemUpdate, MenuBoard, MenuItem, MenuSurface};
pub use pattern::{MatchPattern, RequestFilter};
pub use webrequest::{
    Disposition, HookAction, HostDefaults, HttpHeader, ListenerId, OutgoingRequest,
    RequestDetails, RequestListener, SendOutcome, WebRequestHub,
};
