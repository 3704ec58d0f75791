use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PREFS_VERSION: u32 = 1;
const DATA_DIR: &str = "matchdesk";
const PREFS_FILE: &str = "prefs.json";

/// Per-item liked/saved flags, stored as two id sets. Membership means
/// true; absence means false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    liked: HashSet<String>,
    saved: HashSet<String>,
}

impl Preferences {
    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.saved.contains(id)
    }

    /// Flip the liked flag and return the new state.
    pub fn toggle_like(&mut self, id: &str) -> bool {
        if self.liked.remove(id) {
            false
        } else {
            self.liked.insert(id.to_string());
            true
        }
    }

    /// Flip the saved flag and return the new state.
    pub fn toggle_save(&mut self, id: &str) -> bool {
        if self.saved.remove(id) {
            false
        } else {
            self.saved.insert(id.to_string());
            true
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }
}

/// Durable storage behind the preference sets. Injected so the state layer
/// never touches the filesystem directly.
pub trait PrefsBackend {
    fn load(&self) -> Preferences;
    fn persist(&self, prefs: &Preferences) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct PrefsFile {
    version: u32,
    #[serde(rename = "likedAnalyses", default)]
    liked_analyses: Vec<String>,
    #[serde(rename = "savedAnalyses", default)]
    saved_analyses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Backend at the standard data location, if one can be resolved.
    pub fn default_location() -> Option<Self> {
        prefs_path().map(Self::at)
    }
}

impl PrefsBackend for JsonFileBackend {
    fn load(&self) -> Preferences {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Preferences::default();
        };
        let Ok(file) = serde_json::from_str::<PrefsFile>(&raw) else {
            return Preferences::default();
        };
        if file.version != PREFS_VERSION {
            return Preferences::default();
        }
        Preferences {
            liked: file.liked_analyses.into_iter().collect(),
            saved: file.saved_analyses.into_iter().collect(),
        }
    }

    fn persist(&self, prefs: &Preferences) -> Result<()> {
        let mut liked: Vec<String> = prefs.liked.iter().cloned().collect();
        let mut saved: Vec<String> = prefs.saved.iter().cloned().collect();
        liked.sort();
        saved.sort();
        let file = PrefsFile {
            version: PREFS_VERSION,
            liked_analyses: liked,
            saved_analyses: saved,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("create prefs dir")?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(&file).context("serialize prefs")?;
        fs::write(&tmp, json).context("write prefs")?;
        fs::rename(&tmp, &self.path).context("swap prefs")?;
        Ok(())
    }
}

/// In-memory backend: used in tests and as the fallback when no writable
/// data directory exists, in which case toggles simply do not survive the
/// session.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: RefCell<Preferences>,
}

impl PrefsBackend for MemoryBackend {
    fn load(&self) -> Preferences {
        self.stored.borrow().clone()
    }

    fn persist(&self, prefs: &Preferences) -> Result<()> {
        *self.stored.borrow_mut() = prefs.clone();
        Ok(())
    }
}

fn prefs_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR).join(PREFS_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(PREFS_FILE),
    )
}
