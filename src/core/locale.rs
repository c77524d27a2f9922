//! Language resolution collaborator.

/// Supplies the language messages are rendered in.
pub trait LanguageResolver: Send + Sync {
    /// Current language code, e.g. `en`.
    fn current_langcode(&self) -> String;
}

/// Resolver that always answers with one configured language.
#[derive(Debug, Clone)]
pub struct FixedLocale {
    langcode: String,
}

impl FixedLocale {
    /// Resolver for `langcode`.
    pub fn new(langcode: impl Into<String>) -> Self {
        Self {
            langcode: langcode.into(),
        }
    }
}

impl Default for FixedLocale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl LanguageResolver for FixedLocale {
    fn current_langcode(&self) -> String {
        self.langcode.clone()
    }
}
