use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Static configuration for a texture clipmap.
///
/// Loadable from JSON via [`ClipmapConfig::from_file`]; every field has a
/// usable default so partial config files work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipmapConfig {
    /// Edge length in pixels of each level's resident window. Must be a
    /// positive multiple of `tile_size`.
    pub texture_size: i32,
    /// Edge length in pixels of one backing-store tile.
    pub tile_size: i32,
    /// World-units-to-texels scale applied to the eye position.
    pub texture_density: f32,
    /// RGBA when true, RGB otherwise.
    pub use_alpha: bool,
    /// Tiles outside the window are kept resident this many tiles past its
    /// edge before they are evicted.
    pub cache_margin_tiles: i32,
    /// Minimum wall-clock interval between mailbox drain passes.
    pub update_interval_ms: u64,
}

impl Default for ClipmapConfig {
    fn default() -> Self {
        Self {
            texture_size: 256,
            tile_size: 32,
            texture_density: 1.0,
            use_alpha: false,
            cache_margin_tiles: 1,
            update_interval_ms: 300,
        }
    }
}

impl ClipmapConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let cfg: ClipmapConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn color_bytes(&self) -> usize {
        if self.use_alpha {
            4
        } else {
            3
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size <= 0 {
            return Err(Error::Config(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.texture_size <= 0 || self.texture_size % self.tile_size != 0 {
            return Err(Error::Config(format!(
                "texture_size {} must be a positive multiple of tile_size {}",
                self.texture_size, self.tile_size
            )));
        }
        if self.update_interval_ms == 0 {
            return Err(Error::Config(
                "update_interval_ms must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
