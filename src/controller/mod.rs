//! Accept-Language override controller.
//!
//! # Data Flow
//! ```text
//! configure(options?)
//!     → gateway.rs: load/persist optionList, probe default, clear menu
//!     → menu.rs: rebuild items, register one click handler
//!
//! menu click
//!     → menu.rs: resolve id against the current mapping
//!     → interceptor.rs: set active value, install/remove rewrite hook
//!
//! proxied request
//!     → host hub → HeaderRewriter (reads store.rs active cell)
//! ```
//!
//! # Design Decisions
//! - All runtime state lives in one `AltTong` value passed by reference
//! - The menu lock is a `std::sync::Mutex` never held across an await
//! - Rebuilds are serialized by an async gate so "remove all" always
//!   completes before the next item is created

pub mod gateway;
pub mod interceptor;
pub mod menu;
pub mod probe;
pub mod store;

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::ToggleStyle;
use crate::error::HostError;
use crate::host::{MenuBoard, MenuItem, MenuSurface, WebRequestHub};
use crate::i18n::Messages;
use crate::storage::KeyValueStore;

pub use gateway::ConfigureReport;
pub use interceptor::HeaderOverride;
pub use menu::{ClickHandler, MenuContext, MenuController, MenuShape};
pub use probe::ProbeSettings;
pub use store::{OptionList, OverrideValue, OPT_STORAGE_OPTION_LIST};

/// Snapshot of the controller for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct MenuSnapshot {
    pub items: Vec<MenuItem>,
    pub click_handler: Option<ClickHandler>,
    pub active: Option<OverrideValue>,
    pub interceptor_installed: bool,
}

/// Owns the override state, the menu and their collaborators.
pub struct AltTong {
    header: HeaderOverride,
    menu: Mutex<MenuController>,
    surface: Arc<MenuBoard>,
    storage: Arc<dyn KeyValueStore>,
    hub: Arc<WebRequestHub>,
    messages: Arc<dyn Messages>,
    probe: ProbeSettings,
    generation: AtomicU64,
    rebuild_gate: tokio::sync::Mutex<()>,
}

impl AltTong {
    pub fn new(
        hub: Arc<WebRequestHub>,
        surface: Arc<MenuBoard>,
        storage: Arc<dyn KeyValueStore>,
        messages: Arc<dyn Messages>,
        toggle_style: ToggleStyle,
        probe: ProbeSettings,
    ) -> Self {
        Self {
            header: HeaderOverride::new(hub.clone()),
            menu: Mutex::new(MenuController::new(toggle_style)),
            surface,
            storage,
            hub,
            messages,
            probe,
            generation: AtomicU64::new(0),
            rebuild_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn hub(&self) -> &Arc<WebRequestHub> {
        &self.hub
    }

    pub fn surface(&self) -> &Arc<MenuBoard> {
        &self.surface
    }

    pub fn is_active(&self) -> bool {
        self.header.is_active()
    }

    pub fn active(&self) -> Option<OverrideValue> {
        self.header.current().map(|v| (*v).clone())
    }

    pub fn is_interceptor_installed(&self) -> bool {
        self.header.is_installed()
    }

    /// Deliver a click on `id` to every registered click listener. An id
    /// not on the menu turns the override off and is returned as an error.
    pub fn click_menu_item(&self, id: &str) -> Result<(), HostError> {
        let event = match self.surface.click(id) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(id, error = %e, "Click on stale context menu item id");
                self.header.set_active(None);
                return Err(e);
            }
        };
        let mut menu = self.menu.lock().expect("menu mutex poisoned");
        let ctx = self.menu_context();

        for key in self.surface.click_listeners() {
            match ClickHandler::from_key(key) {
                Some(handler) => menu.on_clicked(&ctx, handler, &event),
                None => {
                    tracing::error!(listener = key, "Unknown click listener registered");
                    self.header.set_active(None);
                }
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> MenuSnapshot {
        let menu = self.menu.lock().expect("menu mutex poisoned");
        MenuSnapshot {
            items: self.surface.items(),
            click_handler: menu.click_handler(),
            active: self.active(),
            interceptor_installed: self.header.is_installed(),
        }
    }

    fn menu_context(&self) -> MenuContext<'_> {
        MenuContext {
            surface: self.surface.as_ref(),
            header: &self.header,
            messages: self.messages.as_ref(),
        }
    }
}
