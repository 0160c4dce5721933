use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Port for the local `/status` endpoint; 0 disables it.
    pub status_port: u16,
    /// Quiet interval before a frame height message is applied.
    pub height_quiet_ms: u64,
    pub frame: FrameConfig,
    pub page: PageLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            status_port: 58421,
            height_quiet_ms: 10,
            frame: FrameConfig::default(),
            page: PageLayout::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FrameConfig {
    pub development_url: String,
    pub production_url: String,
    /// Unpacked extension ids that should load the local dev server.
    pub development_extension_ids: Vec<String>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            development_url: "http://localhost:5173".to_string(),
            production_url: "https://d4a6eolggrfst.cloudfront.net/".to_string(),
            development_extension_ids: vec![
                "aeieohnbigjehliffdcpnaegkiekbdlb".to_string(),
                "dpdollnoobppbpcnfneijbmlkddpfaeg".to_string(),
                "pjomadfjjobkggnpjjhnfhccjkgmplpj".to_string(),
            ],
        }
    }
}

impl FrameConfig {
    pub fn base_for(&self, extension_id: Option<&str>) -> Result<Url> {
        let development = extension_id
            .is_some_and(|id| self.development_extension_ids.iter().any(|dev| dev == id));
        if development {
            self.development_base()
        } else {
            Url::parse(&self.production_url)
                .with_context(|| format!("invalid production_url {:?}", self.production_url))
        }
    }

    pub fn development_base(&self) -> Result<Url> {
        Url::parse(&self.development_url)
            .with_context(|| format!("invalid development_url {:?}", self.development_url))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PageLayout {
    pub tab_bar: String,
    pub content: String,
    pub trigger: String,
    pub frame: String,
    pub trigger_label: String,
    /// Body class the host sets in comparison mode; cleared on open.
    pub compare_class: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            tab_bar: "top-level-view-tabs".to_string(),
            content: "report-view-contents".to_string(),
            trigger: "dk-analyze-btn".to_string(),
            frame: "dk-analyze-iframe".to_string(),
            trigger_label: "DK Analyze".to_string(),
            compare_class: "compare".to_string(),
        }
    }
}

impl PageLayout {
    pub fn tracked_ids(&self) -> Vec<String> {
        vec![
            self.tab_bar.clone(),
            self.content.clone(),
            self.trigger.clone(),
            self.frame.clone(),
        ]
    }
}

/// Extension id of the caller, from the arguments the browser launches us with.
///
/// Chrome passes the caller origin (`chrome-extension://<id>/`), Firefox passes
/// the manifest path followed by the add-on id.
pub fn extension_identity(args: &[String]) -> Option<String> {
    if let Some(origin) = args.iter().find(|arg| arg.starts_with("chrome-extension://")) {
        return Url::parse(origin)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned));
    }
    args.iter()
        .rev()
        .find(|arg| !arg.ends_with(".json") && !arg.contains(['/', '\\']))
        .cloned()
}

pub fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME env var not set")?;
    let mut path = PathBuf::from(home);
    path.push(".dk-analyze");
    if !path.exists() {
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create config directory {}", path.display()))?;
    }
    Ok(path)
}

pub fn load_config() -> Result<Config> {
    let dir = get_config_dir()?;
    load_from(&dir.join("config.toml"))
}

pub fn load_from(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(toml::from_str(&content).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "config did not parse; using defaults");
            Config::default()
        }))
    } else {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).context("failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        Ok(config)
    }
}
