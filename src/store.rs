//! JSON-backed reminder store, one group config per chat.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One registered monitor: ping `user_to_ping` when the reward stream for
/// `reward_token` on `gauge_address` has `hours_before` hours or less left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeReminder {
    pub gauge_address: String,
    pub reward_token: String,
    pub hours_before: u64,
    pub user_to_ping: String,
}

/// One chat's reminders, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    pub gauges: Vec<GaugeReminder>,
}

/// Errors from loading or persisting the store.
#[derive(Debug)]
pub enum StoreError {
    /// Failed to read the state file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// State file exists but is not valid JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Failed to write the state file back out.
    WriteFile { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read state file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse state file '{}': {}", path.display(), source)
            }
            Self::WriteFile { path, source } => {
                write!(f, "failed to write state file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::WriteFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
        }
    }
}

/// Owns the chat-id → group mapping for the process lifetime.
/// Load once at startup, write the whole mapping back after every mutation.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    groups: BTreeMap<String, GroupConfig>,
}

impl Store {
    /// A missing state file starts the store empty; an unparseable one is a
    /// startup error and the caller is expected to abort.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let groups = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError::ParseJson { path: path.clone(), source: e })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::ReadFile { path, source: e }),
        };
        Ok(Self { path, groups })
    }

    /// Full overwrite, pretty-printed. Not atomic; single-writer assumption.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.groups)
            .map_err(|e| StoreError::ParseJson { path: self.path.clone(), source: e })?;
        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::WriteFile { path: self.path.clone(), source: e })
    }

    pub fn group(&self, chat_id: &str) -> Option<&GroupConfig> {
        self.groups.get(chat_id)
    }

    pub fn add_reminder(&mut self, chat_id: &str, reminder: GaugeReminder) {
        self.groups
            .entry(chat_id.to_string())
            .or_default()
            .gauges
            .push(reminder);
    }

    /// Removes every reminder in the chat matching the (gauge, token) pair,
    /// case-insensitively. Duplicates of the pair go together. Returns the
    /// number removed.
    pub fn remove_matching(&mut self, chat_id: &str, gauge: &str, token: &str) -> usize {
        let Some(group) = self.groups.get_mut(chat_id) else {
            return 0;
        };
        let before = group.gauges.len();
        group.gauges.retain(|r| {
            !(r.gauge_address.eq_ignore_ascii_case(gauge)
                && r.reward_token.eq_ignore_ascii_case(token))
        });
        before - group.gauges.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GroupConfig)> {
        self.groups.iter()
    }
}
