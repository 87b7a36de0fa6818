//! Context menu state machine.
//!
//! # Responsibilities
//! - Build menu items from the candidate list (0, 1 or many entries)
//! - Keep exactly one click handler variant registered on the surface
//! - Translate clicks into store and interceptor changes
//!
//! # Menu shapes
//! ```text
//! []            → "configure…" item                     handler: Config
//! [v]           → toggle item (relabel or checkbox)      handler: Toggle
//! [v1, .., vn]  → "default" radio + one radio per value  handler: Radio
//! ```
//!
//! # Design Decisions
//! - Unknown or stale ids are protocol violations: logged, override off
//! - A rebuild starts from a cleared mapping and no active override; the
//!   previous selection is re-applied only if it survives in the new list

use serde::Serialize;

use crate::config::ToggleStyle;
use crate::controller::interceptor::HeaderOverride;
use crate::controller::store::{MenuEntries, OverrideValue};
use crate::host::{ClickEvent, ItemUpdate, MenuItem, MenuSurface};
use crate::i18n::Messages;

pub const CMIID_DEFAULT: &str = "cmiid-default";
pub const CMIID_CHECKBOX: &str = "cmiid-checkbox";
pub const CMIID_OPTIONS: &str = "cmiid-options";
pub const ITEM_ID_PREFIX: &str = "at-i";

/// Prefix of the options item when the last list only repeated the
/// browser default.
const DEGENERATE_MARK: &str = "(!) ";

/// Click handler variants; one is registered at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickHandler {
    Config,
    Toggle,
    Radio,
}

impl ClickHandler {
    pub fn key(self) -> &'static str {
        match self {
            ClickHandler::Config => "config",
            ClickHandler::Toggle => "toggle",
            ClickHandler::Radio => "radio",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "config" => Some(ClickHandler::Config),
            "toggle" => Some(ClickHandler::Toggle),
            "radio" => Some(ClickHandler::Radio),
            _ => None,
        }
    }
}

/// Shape of the menu built by the last rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuShape {
    Config,
    Toggle,
    Radio,
}

/// Collaborators borrowed for one menu operation.
pub struct MenuContext<'a> {
    pub surface: &'a dyn MenuSurface,
    pub header: &'a HeaderOverride,
    pub messages: &'a dyn Messages,
}

/// Menu state owned by the controller.
#[derive(Debug)]
pub struct MenuController {
    entries: MenuEntries,
    click_handler: Option<ClickHandler>,
    toggle_style: ToggleStyle,
    toggle_on: bool,
    last_list: Vec<OverrideValue>,
}

impl MenuController {
    pub fn new(toggle_style: ToggleStyle) -> Self {
        Self {
            entries: MenuEntries::default(),
            click_handler: None,
            toggle_style,
            toggle_on: false,
            last_list: Vec::new(),
        }
    }

    pub fn entries(&self) -> &MenuEntries {
        &self.entries
    }

    pub fn click_handler(&self) -> Option<ClickHandler> {
        self.click_handler
    }

    /// Rebuild the menu for `items`. The surface must already be empty.
    pub fn rebuild(
        &mut self,
        ctx: &MenuContext<'_>,
        items: &[OverrideValue],
        browser_default: Option<&str>,
    ) -> MenuShape {
        let previous = ctx.header.current();
        self.entries.clear();
        ctx.header.set_active(None);

        let shape = match items {
            [] => {
                let is_default = self.last_list_is_default(browser_default);
                self.create_config(ctx, is_default);
                MenuShape::Config
            }
            [item] if item.is_empty() => {
                tracing::error!("Single candidate has an empty value, showing options item");
                self.create_config(ctx, false);
                MenuShape::Config
            }
            [item] => {
                self.create_toggle(ctx, item, previous.is_some());
                MenuShape::Toggle
            }
            _ => {
                let selected = previous
                    .as_deref()
                    .filter(|p| items.iter().any(|i| i.value == p.value))
                    .map(|p| p.value.clone());
                self.create_radios(ctx, items, selected.as_deref());
                MenuShape::Radio
            }
        };

        self.last_list = items.to_vec();
        tracing::info!(
            shape = ?shape,
            entries = self.entries.len(),
            active = ctx.header.is_active(),
            "Context menu rebuilt"
        );
        shape
    }

    /// Dispatch a click to `handler`.
    pub fn on_clicked(&mut self, ctx: &MenuContext<'_>, handler: ClickHandler, event: &ClickEvent) {
        match handler {
            ClickHandler::Config => self.config_clicked(ctx, event),
            ClickHandler::Toggle => self.toggle_clicked(ctx, event),
            ClickHandler::Radio => self.radio_clicked(ctx, event),
        }
    }

    fn last_list_is_default(&self, browser_default: Option<&str>) -> bool {
        match (self.last_list.as_slice(), browser_default) {
            ([only], Some(default)) => only.value == default,
            _ => false,
        }
    }

    fn set_handler(&mut self, ctx: &MenuContext<'_>, handler: Option<ClickHandler>) {
        if handler == self.click_handler {
            return;
        }
        if let Some(old) = self.click_handler.take() {
            ctx.surface.remove_click_listener(old.key());
        }
        match handler {
            Some(new) => {
                ctx.surface.add_click_listener(new.key());
                self.click_handler = Some(new);
            }
            None => {
                tracing::error!("Click handler cleared");
                ctx.header.set_active(None);
            }
        }
    }

    fn create_item(ctx: &MenuContext<'_>, item: MenuItem) {
        let id = item.id.clone();
        if let Err(e) = ctx.surface.create(item) {
            tracing::error!(id = %id, error = %e, "Failed to create menu item");
        }
    }

    fn create_config(&mut self, ctx: &MenuContext<'_>, is_default: bool) {
        let prefix = if is_default { DEGENERATE_MARK } else { "" };
        let title = format!("{prefix}{}", ctx.messages.message("contextMenuOptionsItem"));
        Self::create_item(ctx, MenuItem::normal(CMIID_OPTIONS, title));

        ctx.header.set_active(None);
        self.set_handler(ctx, Some(ClickHandler::Config));
    }

    fn create_toggle(&mut self, ctx: &MenuContext<'_>, item: &OverrideValue, on: bool) {
        self.toggle_on = on;
        let menu_item = match self.toggle_style {
            ToggleStyle::Relabel => {
                MenuItem::normal(CMIID_CHECKBOX, self.toggle_title(ctx, item))
            }
            ToggleStyle::Checkbox => {
                let title = format!("{}: {}", ctx.messages.message("extensionName"), item.label());
                MenuItem::checkbox(CMIID_CHECKBOX, title, on)
            }
        };
        Self::create_item(ctx, menu_item);
        self.entries.insert(CMIID_CHECKBOX, item.clone());
        self.set_handler(ctx, Some(ClickHandler::Toggle));

        if on {
            ctx.header.set_active(Some(item.clone()));
        }
    }

    /// Label for the relabel style: names the action a click performs.
    fn toggle_title(&self, ctx: &MenuContext<'_>, item: &OverrideValue) -> String {
        let action = if self.toggle_on { "menuRemove" } else { "menuApply" };
        format!(
            "{}: {} {}",
            ctx.messages.message("extensionName"),
            ctx.messages.message(action),
            item.label()
        )
    }

    fn create_radios(&mut self, ctx: &MenuContext<'_>, items: &[OverrideValue], selected: Option<&str>) {
        Self::create_item(
            ctx,
            MenuItem::radio(CMIID_DEFAULT, ctx.messages.message("menuDefault"), selected.is_none()),
        );
        self.set_handler(ctx, Some(ClickHandler::Radio));

        let mut selected_id = None;
        for (index, item) in items.iter().enumerate() {
            if item.is_empty() {
                tracing::error!(position = index + 1, "Skipping candidate with empty value");
                continue;
            }
            let id = format!("{ITEM_ID_PREFIX}{}", index + 1);
            let checked = selected_id.is_none() && selected == Some(item.value.as_str());
            if checked {
                selected_id = Some(id.clone());
            }
            self.entries.insert(id.clone(), item.clone());
            Self::create_item(ctx, MenuItem::radio(id, item.label(), checked));
        }

        if let Some(id) = selected_id {
            let event = ClickEvent {
                menu_item_id: id,
                checked: Some(true),
            };
            self.radio_clicked(ctx, &event);
        }
    }

    fn config_clicked(&mut self, ctx: &MenuContext<'_>, event: &ClickEvent) {
        if event.menu_item_id == CMIID_OPTIONS {
            ctx.surface.open_options_page();
        } else {
            tracing::error!(id = %event.menu_item_id, "options: unknown context menu item id");
            ctx.header.set_active(None);
        }
    }

    fn toggle_clicked(&mut self, ctx: &MenuContext<'_>, event: &ClickEvent) {
        let apply = if event.menu_item_id != CMIID_CHECKBOX {
            tracing::error!(
                id = %event.menu_item_id,
                expected = CMIID_CHECKBOX,
                "toggle: unexpected context menu item id"
            );
            false
        } else {
            event.checked.unwrap_or(!self.toggle_on)
        };

        let value = if apply {
            match self.entries.get(CMIID_CHECKBOX) {
                Some(value) => Some(value.clone()),
                None => {
                    tracing::error!(id = %event.menu_item_id, "toggle: unknown context menu item id");
                    None
                }
            }
        } else {
            None
        };

        self.toggle_on = value.is_some();
        let relabel = match (&value, self.entries.get(CMIID_CHECKBOX)) {
            (_, Some(item)) if self.toggle_style == ToggleStyle::Relabel => {
                Some(self.toggle_title(ctx, item))
            }
            _ => None,
        };
        ctx.header.set_active(value);

        if let Some(title) = relabel {
            let update = ItemUpdate {
                title: Some(title),
                checked: None,
            };
            if let Err(e) = ctx.surface.update(CMIID_CHECKBOX, update) {
                tracing::error!(error = %e, "Failed to relabel toggle item");
            }
        }
    }

    fn radio_clicked(&mut self, ctx: &MenuContext<'_>, event: &ClickEvent) {
        if event.menu_item_id == CMIID_DEFAULT {
            ctx.header.set_active(None);
            return;
        }

        match self.entries.get(&event.menu_item_id) {
            Some(value) => ctx.header.set_active(Some(value.clone())),
            None => {
                tracing::error!(id = %event.menu_item_id, "radio: unknown context menu item id");
                ctx.header.set_active(None);
            }
        }
    }
}
