use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_photos_dir")]
    pub photos_dir: String,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Prometheus exporter is only started when this is set.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_metrics_refresh_secs")]
    pub metrics_refresh_secs: u64,
}

fn default_port() -> u16 {
    3000
}

fn default_photos_dir() -> String {
    "fotos".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_body_limit_bytes() -> usize {
    50 * 1024 * 1024 /* 50MiB */
}

fn default_metrics_refresh_secs() -> u64 {
    15
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    envy::from_env::<Config>()
        .unwrap_or_else(|err| panic!("Failed to load configuration from env: {:#?}", err))
});
