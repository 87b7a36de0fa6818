//! Context menu surface.
//!
//! # Responsibilities
//! - Hold menu items in creation order
//! - Track registered click listeners
//! - Turn a click into a click event, moving radio selection and flipping
//!   checkboxes the way a browser menu does
//!
//! # Design Decisions
//! - Listeners are identified by a static key; adding a key twice is a no-op
//! - `remove_all` completes asynchronously, callers must await it before
//!   creating new items
//! - Opening the options page is recorded as a pending request that the
//!   admin API drains

use std::sync::Mutex;

use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;

use crate::error::HostError;

/// Display type of a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Normal,
    Radio,
    Checkbox,
}

/// One menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub checked: bool,
}

impl MenuItem {
    pub fn normal(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            item_type: ItemType::Normal,
            checked: false,
        }
    }

    pub fn radio(id: impl Into<String>, title: impl Into<String>, checked: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            item_type: ItemType::Radio,
            checked,
        }
    }

    pub fn checkbox(id: impl Into<String>, title: impl Into<String>, checked: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            item_type: ItemType::Checkbox,
            checked,
        }
    }
}

/// Partial update of an existing item.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub checked: Option<bool>,
}

/// Delivered to click listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub menu_item_id: String,
    /// State after the click for radio and checkbox items.
    pub checked: Option<bool>,
}

/// Menu host operations.
pub trait MenuSurface: Send + Sync {
    fn create(&self, item: MenuItem) -> Result<(), HostError>;

    fn update(&self, id: &str, update: ItemUpdate) -> Result<(), HostError>;

    fn remove_all(&self) -> BoxFuture<'_, ()>;

    /// Returns false if the listener was already registered.
    fn add_click_listener(&self, key: &'static str) -> bool;

    /// Returns false if the listener was not registered.
    fn remove_click_listener(&self, key: &'static str) -> bool;

    fn click_listeners(&self) -> Vec<&'static str>;

    fn open_options_page(&self);
}

#[derive(Debug, Default)]
struct BoardState {
    items: Vec<MenuItem>,
    listeners: Vec<&'static str>,
    options_requested: bool,
}

/// In-memory menu surface.
#[derive(Debug, Default)]
pub struct MenuBoard {
    state: Mutex<BoardState>,
}

impl MenuBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.lock().items.clone()
    }

    pub fn item(&self, id: &str) -> Option<MenuItem> {
        self.lock().items.iter().find(|i| i.id == id).cloned()
    }

    /// Simulate a user click. Updates checked state and returns the event
    /// to deliver to listeners.
    pub fn click(&self, id: &str) -> Result<ClickEvent, HostError> {
        let mut state = self.lock();
        let idx = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| HostError::UnknownMenuItem(id.to_string()))?;

        let checked = match state.items[idx].item_type {
            ItemType::Normal => None,
            ItemType::Checkbox => {
                let item = &mut state.items[idx];
                item.checked = !item.checked;
                Some(item.checked)
            }
            ItemType::Radio => {
                for (i, item) in state.items.iter_mut().enumerate() {
                    if item.item_type == ItemType::Radio {
                        item.checked = i == idx;
                    }
                }
                Some(true)
            }
        };

        Ok(ClickEvent {
            menu_item_id: id.to_string(),
            checked,
        })
    }

    /// Returns and clears the pending "open options page" request.
    pub fn take_options_request(&self) -> bool {
        std::mem::take(&mut self.lock().options_requested)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardState> {
        self.state.lock().expect("menu board mutex poisoned")
    }
}

impl MenuSurface for MenuBoard {
    fn create(&self, item: MenuItem) -> Result<(), HostError> {
        let mut state = self.lock();
        if state.items.iter().any(|i| i.id == item.id) {
            return Err(HostError::DuplicateMenuItem(item.id));
        }
        if item.item_type == ItemType::Radio && item.checked {
            for other in state.items.iter_mut().filter(|i| i.item_type == ItemType::Radio) {
                other.checked = false;
            }
        }
        state.items.push(item);
        Ok(())
    }

    fn update(&self, id: &str, update: ItemUpdate) -> Result<(), HostError> {
        let mut state = self.lock();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| HostError::UnknownMenuItem(id.to_string()))?;
        if let Some(title) = update.title {
            item.title = title;
        }
        if let Some(checked) = update.checked {
            item.checked = checked;
        }
        Ok(())
    }

    fn remove_all(&self) -> BoxFuture<'_, ()> {
        async move {
            self.lock().items.clear();
        }
        .boxed()
    }

    fn add_click_listener(&self, key: &'static str) -> bool {
        let mut state = self.lock();
        if state.listeners.contains(&key) {
            return false;
        }
        state.listeners.push(key);
        true
    }

    fn remove_click_listener(&self, key: &'static str) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|k| *k != key);
        state.listeners.len() != before
    }

    fn click_listeners(&self) -> Vec<&'static str> {
        self.lock().listeners.clone()
    }

    fn open_options_page(&self) {
        self.lock().options_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_click_moves_selection() {
        let board = MenuBoard::new();
        board.create(MenuItem::radio("a", "A", true)).unwrap();
        board.create(MenuItem::radio("b", "B", false)).unwrap();

        let event = board.click("b").unwrap();
        assert_eq!(event.checked, Some(true));
        assert!(!board.item("a").unwrap().checked);
        assert!(board.item("b").unwrap().checked);
    }

    #[test]
    fn test_checkbox_click_flips() {
        let board = MenuBoard::new();
        board.create(MenuItem::checkbox("c", "C", false)).unwrap();
        assert_eq!(board.click("c").unwrap().checked, Some(true));
        assert_eq!(board.click("c").unwrap().checked, Some(false));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let board = MenuBoard::new();
        board.create(MenuItem::normal("x", "X")).unwrap();
        assert!(matches!(
            board.create(MenuItem::normal("x", "X again")),
            Err(HostError::DuplicateMenuItem(_))
        ));
    }

    #[test]
    fn test_listener_registration_is_idempotent() {
        let board = MenuBoard::new();
        assert!(board.add_click_listener("radio"));
        assert!(!board.add_click_listener("radio"));
        assert_eq!(board.click_listeners(), vec!["radio"]);
        assert!(board.remove_click_listener("radio"));
        assert!(!board.remove_click_listener("radio"));
    }

    #[tokio::test]
    async fn test_remove_all_clears_items() {
        let board = MenuBoard::new();
        board.create(MenuItem::normal("x", "X")).unwrap();
        board.remove_all().await;
        assert!(board.items().is_empty());
        assert!(board.click("x").is_err());
    }
}
