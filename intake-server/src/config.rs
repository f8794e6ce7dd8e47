use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// RSA modulus size for the per-process key pair
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Directory holding `index.html` and `admin.html`
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String, // "local", "memory"
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ClassifierConfig {
    /// JSON array of labelled rows; unset leaves the classifier unavailable
    pub training_data: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            key_bits: default_key_bits(),
            storage: StorageConfig::default(),
            classifier: ClassifierConfig::default(),
            static_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_key_bits() -> usize {
    intake_core::DEFAULT_KEY_BITS
}
fn default_backend() -> String {
    "local".into()
}
fn default_storage_path() -> PathBuf {
    "base_del_proto.json".into()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file("intake-server.toml"))
            .merge(Env::prefixed("INTAKE_").split("__"))
            .extract()?;
        Ok(config)
    }
}
