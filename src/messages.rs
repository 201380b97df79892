// messages.rs - User-Facing Message Catalog
// Copy text lives in messages.json, keyed by language and message key.
// A key may have a per-platform override written as "<key>.<platform tag>";
// lookups fall back from the override to the plain key, then from the
// requested language to the default language.
//
// The repository's messages.json is embedded as the baseline; a file on disk
// (MESSAGES_FILE) is layered on top at startup.

use crate::error::ConfigError;
use crate::platform::Platform;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;

type Tables = HashMap<String, HashMap<String, String>>;

static EMBEDDED: Lazy<Tables> = Lazy::new(|| {
    serde_json::from_str(include_str!("../messages.json")).expect("embedded messages.json is valid")
});

#[derive(Debug, Clone)]
pub struct MessageCatalog {
    default_language: String,
    tables: Tables,
}

impl MessageCatalog {
    pub fn builtin(default_language: &str) -> Self {
        Self {
            default_language: default_language.to_string(),
            tables: EMBEDDED.clone(),
        }
    }

    /// Layer a catalog file over the embedded one. The file is looked up in
    /// the working directory and its parents the same way botconfig.txt is;
    /// a missing file is not an error, a malformed one is.
    pub fn load(file_name: &str, default_language: &str) -> Result<Self, ConfigError> {
        let mut catalog = Self::builtin(default_language);
        let candidates = [
            file_name.to_string(),
            format!("../{}", file_name),
            format!("../../{}", file_name),
            format!("src/{}", file_name),
        ];

        for path in &candidates {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(_) => continue,
            };
            let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
            let overrides: Tables = serde_json::from_str(content).map_err(|source| ConfigError::Catalog {
                path: path.clone(),
                source,
            })?;
            catalog.merge(overrides);
            debug!("💬 Message catalog loaded from: {}", path);
            return Ok(catalog);
        }

        debug!("💬 Using embedded message catalog");
        Ok(catalog)
    }

    fn merge(&mut self, overrides: Tables) {
        for (language, entries) in overrides {
            self.tables.entry(language).or_default().extend(entries);
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.tables.contains_key(language)
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        self.tables.get(language)?.get(key).map(String::as_str)
    }

    fn template(&self, language: &str, key: &str, platform: Option<Platform>) -> &str {
        let specific = platform.map(|p| format!("{}.{}", key, p.tag()));

        for lang in [language, self.default_language.as_str()] {
            if let Some(found) = specific.as_deref().and_then(|k| self.lookup(lang, k)) {
                return found;
            }
            if let Some(found) = self.lookup(lang, key) {
                return found;
            }
        }

        warn!("💬 No message template for key '{}' in '{}' or '{}'", key, language, self.default_language);
        ""
    }

    /// Render a message. `{emoji}` and `{label}` are filled from the platform
    /// when one is given; the rest come from `vars`.
    pub fn render(&self, language: &str, key: &str, platform: Option<Platform>, vars: &[(&str, String)]) -> String {
        let mut text = self.template(language, key, platform).to_string();

        if let Some(platform) = platform {
            text = text.replace("{emoji}", platform.emoji()).replace("{label}", platform.label());
        }
        for (name, value) in vars {
            text = text.replace(&format!("{{{}}}", name), value);
        }

        if text.is_empty() {
            key.to_string()
        } else {
            text
        }
    }

    pub fn text(&self, language: &str, key: &str) -> String {
        self.render(language, key, None, &[])
    }
}

/// Bytes to a one-decimal megabyte figure for display.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / (1024.0 * 1024.0))
}
