use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap().join(".config").join("mosaic").join("editor.toml")
}

/// Editor behavior settings. Everything has a default so an empty (or
/// missing) config file yields a working editor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EditorSettings {
    /// Tag names recognized as layout-root elements.
    #[serde(default = "default_list_selectors")]
    pub list_selectors: Vec<String>,
    #[serde(default = "default_media_screen_ranges")]
    pub media_screen_ranges: Vec<MediaScreenRange>,
    #[serde(default = "default_width_ranges")]
    pub width_ranges: Vec<WidthRange>,
    /// How long a transient message stays visible.
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
    /// Delay between attaching the editor and its first selection reset,
    /// so the surrounding lists are rendered before we read them.
    #[serde(default = "default_init_delay_ms")]
    pub init_delay_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MediaScreenRange {
    pub name: String,
    pub width: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WidthRange {
    pub name: String,
    pub value: String,
}

fn default_list_selectors() -> Vec<String> {
    vec!["tile-list".to_owned(), "tile-grid".to_owned()]
}

fn default_media_screen_ranges() -> Vec<MediaScreenRange> {
    let ranges = [
        ("Mobile", 300.0),
        ("Tablet", 700.0),
        ("Laptop", 900.0),
        ("Desktop", 1100.0),
    ];
    ranges
        .into_iter()
        .map(|(name, width)| MediaScreenRange { name: name.to_owned(), width })
        .collect()
}

fn default_width_ranges() -> Vec<WidthRange> {
    (1..=10)
        .map(|n| WidthRange {
            name: n.to_string(),
            value: format!("{}%", n * 10),
        })
        .collect()
}

fn default_message_timeout_ms() -> u64 { 3000 }

fn default_init_delay_ms() -> u64 { 100 }

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings {
            list_selectors: default_list_selectors(),
            media_screen_ranges: default_media_screen_ranges(),
            width_ranges: default_width_ranges(),
            message_timeout_ms: default_message_timeout_ms(),
            init_delay_ms: default_init_delay_ms(),
        }
    }
}

impl EditorSettings {
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("invalid editor config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let settings = EditorSettings::parse("").unwrap();
        assert_eq!(settings, EditorSettings::default());
        assert_eq!(settings.width_ranges.len(), 10);
        assert_eq!(settings.width_ranges[4].value, "50%");
        assert_eq!(settings.media_screen_ranges.last().unwrap().name, "Desktop");
    }

    #[test]
    fn partial_config_overrides_one_field() {
        let settings = EditorSettings::parse("message_timeout_ms = 500").unwrap();
        assert_eq!(settings.message_timeout_ms, 500);
        assert_eq!(settings.list_selectors, default_list_selectors());
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(EditorSettings::parse("no_such_setting = true").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "list_selectors = [\"tile-table\"]").unwrap();
        let settings = EditorSettings::load(file.path()).unwrap();
        assert_eq!(settings.list_selectors, vec!["tile-table".to_owned()]);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let settings = EditorSettings::load(Path::new("/nonexistent/editor.toml")).unwrap();
        assert_eq!(settings, EditorSettings::default());
    }
}
