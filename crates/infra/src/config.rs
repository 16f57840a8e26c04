use std::path::PathBuf;

use serde::Deserialize;

pub const DATA_DIR_ENV: &str = "EVENTDESK_DATA_DIR";
pub const SEED_ADMIN_ENV: &str = "EVENTDESK_SEED_ADMIN";

/// Where the store keeps its files and how it bootstraps an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    /// Create `admin`/`admin123` when no users are loaded.
    pub seed_default_admin: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            seed_default_admin: true,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Build from `EVENTDESK_DATA_DIR` and `EVENTDESK_SEED_ADMIN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "{DATA_DIR_ENV} not set; using default data dir {}",
                    defaults.data_dir.display()
                );
                defaults.data_dir.clone()
            });

        let seed_default_admin = match lookup(SEED_ADMIN_ENV).as_deref().map(str::trim) {
            None => defaults.seed_default_admin,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                tracing::warn!(value = v, "{SEED_ADMIN_ENV} is not a boolean; using default");
                defaults.seed_default_admin
            }
        };

        Self {
            data_dir,
            seed_default_admin,
        }
    }
}
