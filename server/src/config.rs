use std::{env, path::PathBuf};

use tracing::info;

use crate::fog::MAX_DIM;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub max_image_bytes: u64,
    pub default_radius: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = env::var("FOGMAP_DATA_DIR").unwrap_or_else(|_| "fogmap-data".to_string());

        let max_image_bytes: u64 = env::var("FOGMAP_MAX_IMAGE_BYTES")
            .unwrap_or_else(|_| "16777216".to_string())
            .parse()
            .unwrap_or(16 * 1024 * 1024);

        let default_radius: u32 = env::var("FOGMAP_DEFAULT_RADIUS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .unwrap_or(0);

        let config = Self {
            data_dir: PathBuf::from(data_dir),
            max_image_bytes,
            default_radius: default_radius.min(MAX_DIM),
        };
        info!(
            "Configuration: data dir {}, image limit {} bytes, default radius {}",
            config.data_dir.display(),
            config.max_image_bytes,
            config.default_radius
        );
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("fogmap-data"),
            max_image_bytes: 16 * 1024 * 1024,
            default_radius: 0,
        }
    }
}
