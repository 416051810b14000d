use serde::Deserialize;

// Re-export the visibility settings so a single TOML file configures both
pub use crate::settings::RadarSettings;

/// Complete radar configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RadarConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub eviction: EvictionConfig,
    #[serde(default)]
    pub settings: RadarSettings,
    #[serde(default)]
    pub info: InfoConfig,
}

/// Capture socket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Address the UDP capture socket binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:5056".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Protocol decoding configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// How long an incomplete fragment set may wait for its pieces
    #[serde(default = "default_fragment_ttl")]
    pub fragment_ttl_seconds: u64,
}

fn default_fragment_ttl() -> u64 {
    10
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            fragment_ttl_seconds: default_fragment_ttl(),
        }
    }
}

/// Distance-eviction sweep configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EvictionConfig {
    /// Sweep period in seconds
    #[serde(default = "default_eviction_interval")]
    pub interval_seconds: u64,
    /// Records farther than this from the local player are dropped
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
}

fn default_eviction_interval() -> u64 {
    1
}

fn default_max_distance() -> f32 {
    80.0
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_eviction_interval(),
            max_distance: default_max_distance(),
        }
    }
}

/// External lookup-table configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InfoConfig {
    /// JSON file mapping mob type ids to display data; optional
    #[serde(default)]
    pub mobs_file: Option<String>,
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<RadarConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: RadarConfig = toml::from_str(&contents)?;
    Ok(config)
}
