use std::sync::Arc;

use glam::Vec3;
use tracing::info;

use crate::clipmap::config::ClipmapConfig;
use crate::clipmap::error::Result;
use crate::clipmap::TextureClipmap;
use crate::render::Renderer;
use crate::source::{HeightSource, TextureSource};

/// Everything needed to build a [`Terrain`].
pub struct TerrainInfo {
    pub texture_source: Arc<dyn TextureSource>,
    pub height_source: Arc<dyn HeightSource>,
    pub config: ClipmapConfig,
}

/// Application-facing terrain façade.
///
/// Binds the texture clipmap engine and the height data under one API: the
/// application drives it with one [`Terrain::update`] per frame and queries
/// heights for cameras, physics and picking.
pub struct Terrain {
    clipmap: TextureClipmap,
    height_source: Arc<dyn HeightSource>,
    /// Step used for the finite-difference normal.
    normal_step: f32,
}

impl Terrain {
    pub fn new(info: TerrainInfo) -> Result<Self> {
        info!("--INITIALIZING TERRAIN--");
        let clipmap = TextureClipmap::new(info.texture_source, &info.config)?;
        Ok(Self {
            clipmap,
            height_source: info.height_source,
            normal_step: 1.0,
        })
    }

    /// Per-frame update; forwards the eye position to the clipmap engine.
    pub fn update(&mut self, renderer: &mut dyn Renderer, eye: Vec3) {
        self.clipmap.update(renderer, eye);
    }

    /// Forces a full re-copy of all clipmap levels, e.g. after the texture
    /// source changed wholesale.
    pub fn regenerate(&mut self, renderer: &mut dyn Renderer) {
        self.clipmap.regenerate(renderer);
    }

    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.height_source.height_at(x, z)
    }

    /// Surface normal by central differences over the height field.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let s = self.normal_step;
        let hx0 = self.height_source.height_at(x - s, z);
        let hx1 = self.height_source.height_at(x + s, z);
        let hz0 = self.height_source.height_at(x, z - s);
        let hz1 = self.height_source.height_at(x, z + s);
        Vec3::new(hx0 - hx1, 2.0 * s, hz0 - hz1).normalize()
    }

    pub fn clipmap(&self) -> &TextureClipmap {
        &self.clipmap
    }

    pub fn clipmap_mut(&mut self) -> &mut TextureClipmap {
        &mut self.clipmap
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.clipmap.set_enabled(enabled);
    }

    pub fn set_show_debug(&mut self, show_debug: bool) {
        self.clipmap.set_show_debug(show_debug);
    }

    pub fn set_pixel_density(&mut self, density: f32) {
        self.clipmap.set_pixel_density(density);
    }

    pub fn set_min_visible_level(&mut self, level: usize) {
        self.clipmap.set_min_visible_level(level);
    }
}

#[cfg(test)]
mod tests {
    use crate::source::CheckerTextureSource;

    use super::*;

    struct SlopeHeight;

    impl HeightSource for SlopeHeight {
        fn height_at(&self, x: f32, _z: f32) -> f32 {
            x * 0.5
        }
    }

    fn make_terrain() -> Terrain {
        Terrain::new(TerrainInfo {
            texture_source: Arc::new(CheckerTextureSource::new(2, 16, 8, false)),
            height_source: Arc::new(SlopeHeight),
            config: ClipmapConfig {
                texture_size: 64,
                tile_size: 16,
                ..Default::default()
            },
        })
        .unwrap()
    }

    #[test]
    fn height_queries_pass_through() {
        let terrain = make_terrain();
        assert_eq!(terrain.height_at(10.0, 0.0), 5.0);
    }

    #[test]
    fn normal_leans_against_the_slope() {
        let terrain = make_terrain();
        let n = terrain.normal_at(0.0, 0.0);
        assert!(n.x < 0.0);
        assert!(n.y > 0.0);
        assert!(n.z.abs() < 1e-6);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn toggles_reach_the_clipmap() {
        let mut terrain = make_terrain();
        terrain.set_show_debug(true);
        assert!(terrain.clipmap().is_show_debug());
        terrain.set_enabled(false);
        assert!(!terrain.clipmap().is_enabled());
        terrain.set_min_visible_level(99);
        assert_eq!(terrain.clipmap().min_visible_level(), 1);
    }
}
