#![allow(dead_code)]

use std::path::PathBuf;

use sitepipe::config::{ConfigFile, RawConfigFile};
use sitepipe::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_queue_length(mut self, n: usize) -> Self {
        self.config.watch.queue_length = n;
        self
    }

    pub fn with_styles_src(mut self, patterns: &[&str]) -> Self {
        self.config.styles.src = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_jpeg_quality(mut self, q: u8) -> Self {
        self.config.images.jpeg_quality = q;
        self
    }

    pub fn with_png_quality(mut self, min: u8, target: u8) -> Self {
        self.config.images.png_quality = [min, target];
        self
    }

    pub fn with_clean_assets(mut self, dirs: &[&str]) -> Self {
        self.config.clean.assets = dirs.iter().map(PathBuf::from).collect();
        self
    }

    pub fn with_clean_images(mut self, dir: &str) -> Self {
        self.config.clean.images = PathBuf::from(dir);
        self
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
