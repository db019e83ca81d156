//! Wizard configuration: `[section]` tables of string settings.
//!
//! Built-in defaults sit underneath whatever the user's file sets, so a file
//! only needs the keys it changes. Non-string TOML values are accepted and
//! kept in their TOML spelling (`jobs = 4` reads back as `"4"`).
//!
//! ```toml
//! [setup]
//! install-root = "~/opt/shadow"
//! download = "/var/cache/shadow"
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "setup-tui";
/// File name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "setup.toml";

const DEFAULTS: &[(&str, &str, &str)] = &[
    ("setup", "install-root", "~/.local"),
    ("setup", "download", "~/.shadow/download-cache/"),
    ("setup", "build", "~/.shadow/build-cache/"),
    (
        "setup",
        "openssl",
        "http://www.openssl.org/source/openssl-1.0.0d.tar.gz",
    ),
    (
        "setup",
        "libevent",
        "http://monkey.org/~provos/libevent-2.0.11-stable.tar.gz",
    ),
    (
        "setup",
        "shadow",
        "http://shadow.cs.umn.edu/downloads/shadow-release.tar.gz",
    ),
    (
        "setup",
        "resources",
        "http://shadow.cs.umn.edu/downloads/shadow-resources.tar.gz",
    ),
];

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Merged defaults and user settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Config {
    sections: Sections,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let mut sections = Sections::new();
        for (section, key, value) in DEFAULTS {
            sections
                .entry((*section).to_string())
                .or_default()
                .insert((*key).to_string(), (*value).to_string());
        }
        Self {
            sections,
            path: None,
        }
    }
}

impl Config {
    /// `$CONFIG_DIR/setup-tui/setup.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from [`Config::default_path`], or plain defaults when there is
    /// no config dir.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load `path` over the defaults. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the file cannot be read or is not a TOML
    /// document made of tables.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(config);
            }
            Err(e) => return Err(config_error(path, e.to_string())),
        };
        config
            .merge_str(&text)
            .map_err(|reason| config_error(path, reason))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse `text` over the defaults, with no backing file.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed input.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config = Self::default();
        config
            .merge_str(text)
            .map_err(|reason| config_error(Path::new("<string>"), reason))?;
        Ok(config)
    }

    fn merge_str(&mut self, text: &str) -> std::result::Result<(), String> {
        let table: toml::Table = toml::from_str(text).map_err(|e| e.message().to_string())?;
        for (section, values) in table {
            let toml::Value::Table(values) = values else {
                return Err(format!("'{section}' must be a [section] table"));
            };
            let entries = self.sections.entry(section).or_default();
            for (key, value) in values {
                let value = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                entries.insert(key, value);
            }
        }
        Ok(())
    }

    /// File this config was loaded from and saves to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_or<'a>(&'a self, section: &str, key: &str, fallback: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(fallback)
    }

    /// True for `1`, `yes`, `true` or `on` in any case; false otherwise,
    /// including when unset.
    #[must_use]
    pub fn get_bool(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "yes" | "true" | "on"
            )
        })
    }

    /// A setting read as a path, with `~` expanded.
    #[must_use]
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get(section, key).map(expand_path)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Section names, sorted.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Write to the file this config was loaded from.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if there is no backing path or writing fails.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_deref().ok_or_else(|| Error::Config {
            path: PathBuf::new(),
            reason: "config has no file to save to".to_string(),
        })?;
        self.save_to(path)
    }

    /// Write the merged config to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the path when serializing or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self).map_err(|e| config_error(path, e.to_string()))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| config_error(path, e.to_string()))?;
        }
        fs::write(path, text).map_err(|e| config_error(path, e.to_string()))?;
        tracing::info!(path = %path.display(), "saved config");
        Ok(())
    }
}

fn config_error(path: &Path, reason: String) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        reason,
    }
}

/// Expand a leading `~` to the home directory. Other paths are returned
/// unchanged, as is `~` when there is no home directory.
#[must_use]
pub fn expand_path(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_present() {
        let config = Config::default();
        assert_eq!(config.get("setup", "install-root"), Some("~/.local"));
        assert!(config.get("setup", "openssl").unwrap().ends_with(".tar.gz"));
        assert_eq!(config.get("setup", "missing"), None);
        assert_eq!(config.get_or("setup", "missing", "x"), "x");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.path(), Some(path.as_path()));
        assert_eq!(config.get("setup", "build"), Some("~/.shadow/build-cache/"));
    }

    #[test]
    fn test_user_values_override_defaults() {
        let config = Config::from_toml(
            "[setup]\ninstall-root = \"/opt/shadow\"\njobs = 4\n\n[extra]\nverbose = true\n",
        )
        .unwrap();
        assert_eq!(config.get("setup", "install-root"), Some("/opt/shadow"));
        assert_eq!(config.get("setup", "download"), Some("~/.shadow/download-cache/"));
        assert_eq!(config.get("setup", "jobs"), Some("4"));
        assert!(config.get_bool("extra", "verbose"));
        assert_eq!(config.sections().collect::<Vec<_>>(), ["extra", "setup"]);
    }

    #[test]
    fn test_get_bool_spellings() {
        let mut config = Config::default();
        for (value, expected) in [("1", true), ("Yes", true), ("ON", true), ("0", false), ("nope", false)] {
            config.set("flags", "x", value);
            assert_eq!(config.get_bool("flags", "x"), expected, "{value}");
        }
        assert!(!config.get_bool("flags", "unset"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[setup\ninstall-root = ").unwrap();
        let err = Config::load(&path).unwrap_err();
        match err {
            Error::Config { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error {other:?}"),
        }

        assert!(Config::from_toml("top = 1\n").is_err());
    }

    #[test]
    fn test_save_creates_directories_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cfg/setup.toml");
        let mut config = Config::load(&path).unwrap();
        config.set("setup", "install-root", "/srv/shadow");
        config.save().unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.get("setup", "install-root"), Some("/srv/shadow"));
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_save_without_path_fails() {
        assert!(matches!(Config::default().save(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/etc/x"), PathBuf::from("/etc/x"));
        assert_eq!(expand_path("rel/~x"), PathBuf::from("rel/~x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/a/b"), home.join("a/b"));
        }
    }
}
