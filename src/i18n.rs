//! Localized menu labels.

use std::sync::Arc;

/// Message lookup.
pub trait Messages: Send + Sync {
    /// Localized text for `key`; unknown keys render as the key itself.
    fn message(&self, key: &str) -> String;
}

/// Supported locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Ru,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }

    /// Primary subtag match: "ru-RU" → Ru.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }

    /// Configured tag first, then the system locale, then English.
    pub fn resolve(configured: Option<&str>) -> Self {
        configured
            .and_then(Self::from_tag)
            .or_else(|| sys_locale::get_locale().as_deref().and_then(Self::from_tag))
            .unwrap_or(Locale::En)
    }
}

/// Built-in message catalog.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn shared(locale: Locale) -> Arc<dyn Messages> {
        Arc::new(Self::new(locale))
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let text = match (self.locale, key) {
            (_, "extensionName") => "Alt Tong",
            (Locale::En, "contextMenuOptionsItem") => "Alt Tong: configure Accept-Language…",
            (Locale::En, "menuDefault") => "Browser default",
            (Locale::En, "menuApply") => "use",
            (Locale::En, "menuRemove") => "stop using",
            (Locale::Ru, "contextMenuOptionsItem") => "Alt Tong: настроить Accept-Language…",
            (Locale::Ru, "menuDefault") => "Как в браузере",
            (Locale::Ru, "menuApply") => "использовать",
            (Locale::Ru, "menuRemove") => "не использовать",
            _ => return None,
        };
        Some(text)
    }
}

impl Messages for Catalog {
    fn message(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(text) => text.to_string(),
            None => {
                tracing::warn!(key, locale = self.locale.code(), "Missing message");
                key.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("ru-RU"), Some(Locale::Ru));
        assert_eq!(Locale::from_tag("en_GB.UTF-8"), Some(Locale::En));
        assert_eq!(Locale::from_tag("de"), None);
    }

    #[test]
    fn test_configured_locale_wins() {
        assert_eq!(Locale::resolve(Some("ru")), Locale::Ru);
    }

    #[test]
    fn test_unknown_key_renders_as_key() {
        let catalog = Catalog::new(Locale::En);
        assert_eq!(catalog.message("menuDefault"), "Browser default");
        assert_eq!(catalog.message("noSuchKey"), "noSuchKey");
    }
}
