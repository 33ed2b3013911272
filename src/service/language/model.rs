use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Locale used until a language has been chosen.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Russian,
    #[default]
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Chinese,
}

impl Language {
    /// Picker order.
    pub const ALL: [Language; 8] = [
        Language::Russian,
        Language::English,
        Language::German,
        Language::French,
        Language::Spanish,
        Language::Italian,
        Language::Portuguese,
        Language::Chinese,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Chinese => "zh",
        }
    }

    /// Name of the language in itself, shown on picker buttons.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::Russian => "🇷🇺 Русский",
            Language::English => "🇬🇧 English",
            Language::German => "🇩🇪 Deutsch",
            Language::French => "🇫🇷 Français",
            Language::Spanish => "🇪🇸 Español",
            Language::Italian => "🇮🇹 Italiano",
            Language::Portuguese => "🇵🇹 Português",
            Language::Chinese => "🇨🇳 中文",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.code() == s)
            .ok_or_else(|| format!("Unknown language code: {}", s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
