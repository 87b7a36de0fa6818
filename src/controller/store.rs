//! Header override state.
//!
//! # Responsibilities
//! - Candidate values and the persisted option list record
//! - Insertion-ordered menu id → value mapping for the current menu generation
//! - The shared active-override cell read by the rewrite hook
//!
//! # Design Decisions
//! - The active cell is an `ArcSwapOption`: the request path reads it without
//!   taking the controller lock
//! - The mapping is rebuilt from scratch on every reconfiguration, so ids from
//!   a previous generation never resolve

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

/// Storage key of the candidate list.
pub const OPT_STORAGE_OPTION_LIST: &str = "optionList";

/// A language-tag value with an optional display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl OverrideValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            title: None,
        }
    }

    pub fn titled(value: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            title: Some(title.into()),
        }
    }

    /// Display label: the title when present and non-empty, else the value.
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// The structural record passed to `configure` and persisted in storage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionList {
    #[serde(rename = "optionList", default)]
    pub option_list: Vec<OverrideValue>,
}

impl OptionList {
    pub fn new(option_list: Vec<OverrideValue>) -> Self {
        Self { option_list }
    }

    /// Options-form semantics: trimmed value, empty value → empty list,
    /// empty title omitted.
    pub fn from_form(value: &str, title: Option<&str>) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::default();
        }
        let entry = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => OverrideValue::titled(value, title),
            None => OverrideValue::new(value),
        };
        Self::new(vec![entry])
    }
}

/// Menu id → override value for the current menu generation.
#[derive(Debug, Clone, Default)]
pub struct MenuEntries {
    entries: Vec<(String, OverrideValue)>,
}

impl MenuEntries {
    pub fn insert(&mut self, id: impl Into<String>, value: OverrideValue) {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((id, value)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&OverrideValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, value)| value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

/// Shared zero-or-one active override.
#[derive(Debug, Clone, Default)]
pub struct ActiveOverride {
    cell: Arc<ArcSwapOption<OverrideValue>>,
}

impl ActiveOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<OverrideValue>> {
        self.cell.load_full()
    }

    pub fn set(&self, value: Option<OverrideValue>) {
        self.cell.store(value.map(Arc::new));
    }

    pub fn is_some(&self) -> bool {
        self.cell.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_list_wire_format() {
        let list = OptionList::new(vec![
            OverrideValue::titled("fr", "Fr"),
            OverrideValue::new("de"),
        ]);
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(
            value,
            json!({ "optionList": [{ "value": "fr", "title": "Fr" }, { "value": "de" }] })
        );

        let parsed: OptionList = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.option_list.is_empty());
    }

    #[test]
    fn test_from_form_trims_and_drops_empty() {
        assert_eq!(OptionList::from_form("  ", Some("x")), OptionList::default());
        assert_eq!(
            OptionList::from_form(" ru-RU,ru ", Some("  ")),
            OptionList::new(vec![OverrideValue::new("ru-RU,ru")])
        );
        assert_eq!(
            OptionList::from_form("fr", Some(" French ")),
            OptionList::new(vec![OverrideValue::titled("fr", "French")])
        );
    }

    #[test]
    fn test_label_falls_back_to_value() {
        assert_eq!(OverrideValue::new("fr").label(), "fr");
        assert_eq!(OverrideValue::titled("fr", "").label(), "fr");
        assert_eq!(OverrideValue::titled("fr", "French").label(), "French");
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut entries = MenuEntries::default();
        entries.insert("at-i2", OverrideValue::new("de"));
        entries.insert("at-i1", OverrideValue::new("fr"));
        assert_eq!(entries.ids().collect::<Vec<_>>(), vec!["at-i2", "at-i1"]);
        assert_eq!(entries.get("at-i1").map(|v| v.value.as_str()), Some("fr"));

        entries.clear();
        assert!(entries.get("at-i1").is_none());
    }

    #[test]
    fn test_active_override_shared_between_clones() {
        let active = ActiveOverride::new();
        let reader = active.clone();
        active.set(Some(OverrideValue::new("fr")));
        assert_eq!(reader.get().unwrap().value, "fr");
        active.set(None);
        assert!(!reader.is_some());
    }
}
