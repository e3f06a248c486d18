//! Action registry: cached, server-declared action definitions

use std::sync::Arc;
use tracing::{debug, warn};

use super::client::ActionBackend;
use super::types::ActionDefinition;
use crate::error::Result;
use crate::ui::WidgetStrings;

/// Cache of action definitions for the active locale
///
/// A failed fetch never clears the cache: chat keeps working even when
/// actions are unavailable.
pub struct ActionRegistry {
    backend: Arc<dyn ActionBackend>,
    locale: String,
    strings: WidgetStrings,
    actions: Vec<ActionDefinition>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new(
        backend: Arc<dyn ActionBackend>,
        locale: impl Into<String>,
        strings: WidgetStrings,
    ) -> Self {
        Self {
            backend,
            locale: locale.into(),
            strings,
            actions: Vec::new(),
        }
    }

    /// Backend used for fetches and submissions
    #[must_use]
    pub fn backend(&self) -> Arc<dyn ActionBackend> {
        Arc::clone(&self.backend)
    }

    /// Fetch definitions for the current locale and replace the cache
    ///
    /// Returns whether the cache was updated.
    pub async fn fetch_actions(&mut self) -> bool {
        let locale = self.locale.clone();
        let result = self.backend.fetch_actions(&locale).await;
        self.apply_fetch(&locale, result)
    }

    /// Apply the outcome of a fetch started for `locale`
    ///
    /// Results for a locale that is no longer active are discarded.
    pub fn apply_fetch(&mut self, locale: &str, result: Result<Vec<ActionDefinition>>) -> bool {
        if locale != self.locale {
            debug!(
                requested = locale,
                active = %self.locale,
                "Discarding action list for stale locale"
            );
            return false;
        }

        match result {
            Ok(actions) => {
                debug!(locale, count = actions.len(), "Action cache refreshed");
                self.actions = actions;
                true
            }
            Err(e) => {
                warn!(locale, error = %e, "Failed to fetch actions, keeping cached list");
                false
            }
        }
    }

    /// Look up an action by id
    #[must_use]
    pub fn get_action(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// All cached actions
    #[must_use]
    pub fn actions(&self) -> &[ActionDefinition] {
        &self.actions
    }

    /// Active locale
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Change the locale used by subsequent fetches
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    /// Strings used by subsequent renders
    #[must_use]
    pub fn strings(&self) -> &WidgetStrings {
        &self.strings
    }

    /// Replace the strings used by subsequent renders
    pub fn set_strings(&mut self, strings: WidgetStrings) {
        self.strings = strings;
    }
}
