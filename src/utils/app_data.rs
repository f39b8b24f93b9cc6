use crate::index::types::{DEFAULT_MIN_RATIO, DEFAULT_PAGE_SIZE, SearchOptions};
use crate::sprite::fetch::ResourceLayout;
use crate::sprite::types::GROUP_SIZE;
use crate::sprite::writer::PackOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "vvsearch";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hits per result page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Minimum match ratio (0-100) for approximate hits
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,

    /// Minimum record similarity (0-1)
    #[serde(default)]
    pub min_similarity: f64,

    /// Folders per sprite group
    #[serde(default = "default_group_size")]
    pub group_size: u32,

    /// Frame fetches in flight at once
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Frames kept in memory; 0 disables the cache
    #[serde(default = "default_frame_cache_size")]
    pub frame_cache_size: usize,

    #[serde(default = "default_index_name_template")]
    pub index_name_template: String,

    #[serde(default = "default_blob_name_template")]
    pub blob_name_template: String,

    /// Corpus directory or record file used when none is given
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    /// Sprite location: a directory or an `http(s)://` base URL
    #[serde(default)]
    pub sprite_source: Option<String>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_min_ratio() -> f64 {
    DEFAULT_MIN_RATIO
}

fn default_group_size() -> u32 {
    GROUP_SIZE
}

fn default_fetch_concurrency() -> usize {
    8
}

fn default_frame_cache_size() -> usize {
    256
}

fn default_index_name_template() -> String {
    "{group}.index".to_string()
}

fn default_blob_name_template() -> String {
    "{group}.webp".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            min_ratio: default_min_ratio(),
            min_similarity: 0.0,
            group_size: default_group_size(),
            fetch_concurrency: default_fetch_concurrency(),
            frame_cache_size: default_frame_cache_size(),
            index_name_template: default_index_name_template(),
            blob_name_template: default_blob_name_template(),
            corpus_path: None,
            sprite_source: None,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load config from `path`, or return default if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Search options seeded from this config
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            min_ratio: self.min_ratio,
            min_similarity: self.min_similarity,
            page_size: self.page_size,
            ..SearchOptions::default()
        }
    }

    /// Resource naming for sprite lookups
    pub fn resource_layout(&self) -> ResourceLayout {
        ResourceLayout {
            group_size: self.group_size,
            index_template: self.index_name_template.clone(),
            blob_template: self.blob_name_template.clone(),
        }
    }

    /// Pack settings using this config's grouping and naming
    pub fn pack_options(&self) -> PackOptions {
        PackOptions {
            group_size: self.group_size,
            index_template: self.index_name_template.clone(),
            blob_template: self.blob_name_template.clone(),
            ..PackOptions::default()
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
