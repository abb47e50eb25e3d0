//! Per-device `.joy` configuration files
//!
//! ```json
//! {
//!   "buttonLabels": { "button1": "jab" },
//!   "p1": {
//!     "up": "FBK_UPARROW",
//!     "jab": "FBK_A",
//!     "button2": "FBK_S",
//!     "sfLayout": { "button1": "FBK_Z" }
//!   }
//! }
//! ```
//!
//! Only a syntax error rejects the file. A section, label table or value of
//! the wrong JSON type is skipped and the rest of the file still applies.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::LayoutError;
use crate::input::state::MAX_JOY_BUTTONS;

pub const PLAYERS: usize = 4;

/// File name for a device identity: non-alphanumerics become `-`
pub fn config_file_name(identity: &str) -> String {
    let stem: String = identity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}.joy", stem)
}

/// Bindings of one player section
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlayerConfig {
    #[serde(rename = "sfLayout", default, deserialize_with = "object_or_none")]
    pub sf_layout: Option<HashMap<String, Value>>,

    #[serde(flatten)]
    pub bindings: HashMap<String, Value>,
}

impl PlayerConfig {
    /// String value bound to `key`; other JSON types are ignored
    pub fn binding(&self, key: &str) -> Option<&str> {
        self.bindings.get(key).and_then(Value::as_str)
    }

    pub fn sf_binding(&self, key: &str) -> Option<&str> {
        self.sf_layout
            .as_ref()
            .and_then(|sf| sf.get(key))
            .and_then(Value::as_str)
    }
}

/// Parsed `.joy` file
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JoyConfig {
    #[serde(rename = "buttonLabels", default, deserialize_with = "string_labels")]
    pub button_labels: HashMap<String, String>,

    #[serde(default, deserialize_with = "player_or_none")]
    pub p1: Option<PlayerConfig>,
    #[serde(default, deserialize_with = "player_or_none")]
    pub p2: Option<PlayerConfig>,
    #[serde(default, deserialize_with = "player_or_none")]
    pub p3: Option<PlayerConfig>,
    #[serde(default, deserialize_with = "player_or_none")]
    pub p4: Option<PlayerConfig>,
}

impl JoyConfig {
    pub fn parse(content: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(content).map_err(|e| LayoutError::Malformed(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LayoutError::Malformed(format!("{}: {}", path.display(), e)))
    }

    /// First matching file for `identity` in `dirs`
    pub fn locate(dirs: &[PathBuf], identity: &str) -> Result<PathBuf, LayoutError> {
        let file_name = config_file_name(identity);
        for dir in dirs {
            let candidate = dir.join(&file_name);
            debug!("Looking for layout file {}", candidate.display());
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(LayoutError::NotFound(file_name))
    }

    /// Player section by zero-based index
    pub fn player(&self, index: usize) -> Option<&PlayerConfig> {
        match index {
            0 => self.p1.as_ref(),
            1 => self.p2.as_ref(),
            2 => self.p3.as_ref(),
            3 => self.p4.as_ref(),
            _ => None,
        }
    }

    /// Zero-based button for a `buttonN` key or a declared label
    pub fn button_index(&self, key: &str) -> Option<u8> {
        parse_button(key).or_else(|| {
            self.button_labels
                .iter()
                .filter(|(_, label)| label.as_str() == key)
                .find_map(|(button, _)| parse_button(button))
        })
    }
}

/// Zero-based button for a `buttonN` key, 1..=28
pub(crate) fn parse_button(key: &str) -> Option<u8> {
    let number = key.strip_prefix("button")?.parse::<usize>().ok()?;
    (1..=MAX_JOY_BUTTONS)
        .contains(&number)
        .then(|| (number - 1) as u8)
}

fn string_labels<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(labels) = value.as_object() else {
        debug!("Ignoring buttonLabels: not an object");
        return Ok(HashMap::new());
    };
    Ok(labels
        .iter()
        .filter_map(|(button, label)| label.as_str().map(|l| (button.clone(), l.to_string())))
        .collect())
}

fn object_or_none<'de, D>(deserializer: D) -> Result<Option<HashMap<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(Some(map.into_iter().collect())),
        Value::Null => Ok(None),
        other => {
            debug!("Ignoring sfLayout: expected an object, got {}", other);
            Ok(None)
        }
    }
}

fn player_or_none<'de, D>(deserializer: D) -> Result<Option<PlayerConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        if !value.is_null() {
            debug!("Ignoring player section: expected an object, got {}", value);
        }
        return Ok(None);
    }
    // Every field of an object section is itself lenient
    Ok(serde_json::from_value(value).ok())
}
