// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! UI preferences: theme, language and notification settings.

use serde::{Deserialize, Serialize};

use super::{ClientError, LocalStorage};

const THEME_KEY: &str = "theme";
const LANGUAGE_KEY: &str = "language";
const NOTIFICATIONS_KEY: &str = "notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Supported interface languages, stored by ISO 639-1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::French,
        Language::English,
        Language::German,
        Language::Italian,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::English => "en",
            Language::German => "de",
            Language::Italian => "it",
        }
    }

    /// Name in the language itself, as shown in the selector.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::French => "Français",
            Language::English => "English",
            Language::German => "Deutsch",
            Language::Italian => "Italiano",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifications {
    pub email: bool,
    pub app: bool,
    /// Periodic summary digest
    pub summary: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            email: true,
            app: true,
            summary: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Email,
    App,
    Summary,
}

/// Preference state for the lifetime of the application.
pub struct Preferences {
    storage: LocalStorage,
    theme: Theme,
    language: Language,
    notifications: Notifications,
}

impl Preferences {
    /// Load from storage; the theme falls back to the system preference.
    pub fn load(storage: LocalStorage, system_prefers_dark: bool) -> Self {
        let theme = storage.get(THEME_KEY).unwrap_or(if system_prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        });
        let language = storage.get(LANGUAGE_KEY).unwrap_or_default();
        let notifications = storage.get(NOTIFICATIONS_KEY).unwrap_or_default();

        Self {
            storage,
            theme,
            language,
            notifications,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn notifications(&self) -> Notifications {
        self.notifications
    }

    /// Flip light/dark and persist the choice.
    pub fn toggle_theme(&mut self) -> Result<Theme, ClientError> {
        self.theme = self.theme.toggled();
        self.storage.set(THEME_KEY, &self.theme)?;
        tracing::debug!(theme = ?self.theme, "Theme changed");
        Ok(self.theme)
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), ClientError> {
        self.language = language;
        self.storage.set(LANGUAGE_KEY, &language)
    }

    /// Flip one notification setting; returns its new value.
    pub fn toggle_notification(&mut self, kind: NotificationKind) -> Result<bool, ClientError> {
        let flag = match kind {
            NotificationKind::Email => &mut self.notifications.email,
            NotificationKind::App => &mut self.notifications.app,
            NotificationKind::Summary => &mut self.notifications.summary,
        };
        *flag = !*flag;
        let value = *flag;
        self.storage.set(NOTIFICATIONS_KEY, &self.notifications)?;
        Ok(value)
    }

    /// Persist everything and release the storage handle.
    pub fn close(self) -> Result<(), ClientError> {
        self.storage.set(THEME_KEY, &self.theme)?;
        self.storage.set(LANGUAGE_KEY, &self.language)?;
        self.storage.set(NOTIFICATIONS_KEY, &self.notifications)
    }
}
