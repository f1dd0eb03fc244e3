use std::path::Path;

use glam::Vec4;
use image::RgbaImage;
use tracing::info;

use crate::clipmap::error::Result;
use crate::clipmap::region::Tile;
use crate::utils::math::modulo;

/// Backing store for clipmap texture data.
///
/// Implementations are queried from cache worker threads, so fetching may
/// block on I/O or computation; the render thread never calls
/// [`TextureSource::fetch_tile`] directly.
pub trait TextureSource: Send + Sync {
    /// Number of resolution levels available, level 0 being the finest.
    fn level_count(&self) -> usize;

    /// Edge length in pixels of the tiles this source serves.
    fn tile_size(&self) -> i32;

    /// Global color modulation, queried once per frame.
    fn tint_color(&self) -> Vec4 {
        Vec4::ONE
    }

    /// Fetches the pixel data for one tile, `tile_size * tile_size` pixels in
    /// the clipmap's configured format (RGB or RGBA, row-major).
    ///
    /// `None` means the tile is unavailable; the cache treats it as
    /// non-resident and the level it belongs to never validates until the
    /// data appears.
    fn fetch_tile(&self, tile: Tile) -> Option<Vec<u8>>;
}

/// Point height queries consumed by the terrain façade.
pub trait HeightSource: Send + Sync {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

/// Height source for a perfectly flat terrain.
#[derive(Default)]
pub struct FlatHeightSource {
    pub height: f32,
}

impl HeightSource for FlatHeightSource {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }
}

/// Procedural checkerboard source, handy as a default texture and for
/// debugging streaming behavior: the pattern makes toroidal seams obvious.
pub struct CheckerTextureSource {
    levels: usize,
    tile_size: i32,
    cell_size: i32,
    use_alpha: bool,
}

impl CheckerTextureSource {
    pub fn new(levels: usize, tile_size: i32, cell_size: i32, use_alpha: bool) -> Self {
        Self {
            levels,
            tile_size,
            cell_size,
            use_alpha,
        }
    }
}

impl TextureSource for CheckerTextureSource {
    fn level_count(&self) -> usize {
        self.levels
    }

    fn tile_size(&self) -> i32 {
        self.tile_size
    }

    fn fetch_tile(&self, tile: Tile) -> Option<Vec<u8>> {
        if tile.level >= self.levels {
            return None;
        }
        let bytes = if self.use_alpha { 4 } else { 3 };
        let ts = self.tile_size;
        let mut data = Vec::with_capacity((ts * ts) as usize * bytes);
        for y in 0..ts {
            for x in 0..ts {
                let px = tile.x * ts + x;
                let py = tile.y * ts + y;
                let light = (px.div_euclid(self.cell_size) + py.div_euclid(self.cell_size)) % 2 == 0;
                let color: [u8; 4] = if light {
                    [200, 50, 200, 255]
                } else {
                    [50, 15, 50, 255]
                };
                data.extend_from_slice(&color[..bytes]);
            }
        }
        Some(data)
    }
}

/// Texture source backed by a single loaded image.
///
/// Coarser levels are derived up front by 2x2 box filtering; tile lookups
/// wrap at the image edges so the terrain tiles endlessly.
pub struct ImageTextureSource {
    mips: Vec<MipLevel>,
    tile_size: i32,
    use_alpha: bool,
    tint: Vec4,
}

struct MipLevel {
    width: i32,
    height: i32,
    pixels: Vec<u8>, // RGBA
}

impl ImageTextureSource {
    pub fn from_file(path: impl AsRef<Path>, tile_size: i32, use_alpha: bool) -> Result<Self> {
        let img = image::open(path)?.to_rgba8();
        Ok(Self::from_image(img, tile_size, use_alpha))
    }

    pub fn from_image(img: RgbaImage, tile_size: i32, use_alpha: bool) -> Self {
        let (w, h) = img.dimensions();
        let mut mips = vec![MipLevel {
            width: w as i32,
            height: h as i32,
            pixels: img.into_raw(),
        }];
        while mips.last().unwrap().width.min(mips.last().unwrap().height) >= tile_size * 2 {
            mips.push(downsample(mips.last().unwrap()));
        }
        info!(
            "image texture source: {}x{}, {} levels, tile size {}",
            w,
            h,
            mips.len(),
            tile_size
        );
        Self {
            mips,
            tile_size,
            use_alpha,
            tint: Vec4::ONE,
        }
    }

    pub fn set_tint(&mut self, tint: Vec4) {
        self.tint = tint;
    }
}

fn downsample(src: &MipLevel) -> MipLevel {
    let width = (src.width / 2).max(1);
    let height = (src.height / 2).max(1);
    let mut pixels = Vec::with_capacity((width * height) as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0u32; 4];
            for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                let sx = (x * 2 + dx).min(src.width - 1);
                let sy = (y * 2 + dy).min(src.height - 1);
                let base = ((sy * src.width + sx) * 4) as usize;
                for c in 0..4 {
                    acc[c] += src.pixels[base + c] as u32;
                }
            }
            pixels.extend(acc.iter().map(|&v| (v / 4) as u8));
        }
    }
    MipLevel {
        width,
        height,
        pixels,
    }
}

impl TextureSource for ImageTextureSource {
    fn level_count(&self) -> usize {
        self.mips.len()
    }

    fn tile_size(&self) -> i32 {
        self.tile_size
    }

    fn tint_color(&self) -> Vec4 {
        self.tint
    }

    fn fetch_tile(&self, tile: Tile) -> Option<Vec<u8>> {
        let mip = self.mips.get(tile.level)?;
        let bytes = if self.use_alpha { 4 } else { 3 };
        let ts = self.tile_size;
        let mut data = Vec::with_capacity((ts * ts) as usize * bytes);
        for y in 0..ts {
            let py = modulo(tile.y * ts + y, mip.height);
            for x in 0..ts {
                let px = modulo(tile.x * ts + x, mip.width);
                let base = ((py * mip.width + px) * 4) as usize;
                data.extend_from_slice(&mip.pixels[base..base + bytes]);
            }
        }
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_tiles_have_the_configured_size() {
        let source = CheckerTextureSource::new(3, 16, 8, false);
        let tile = source.fetch_tile(Tile::new(-1, 2, 0)).unwrap();
        assert_eq!(tile.len(), 16 * 16 * 3);
        assert!(source.fetch_tile(Tile::new(0, 0, 3)).is_none());
    }

    #[test]
    fn checker_pattern_is_consistent_across_tiles() {
        let source = CheckerTextureSource::new(1, 8, 8, false);
        // Pixel (7,0) of tile (0,0) and pixel (0,0) of tile (1,0) sit in
        // different checker cells.
        let a = source.fetch_tile(Tile::new(0, 0, 0)).unwrap();
        let b = source.fetch_tile(Tile::new(1, 0, 0)).unwrap();
        assert_ne!(&a[7 * 3..7 * 3 + 3], &b[0..3]);
    }

    #[test]
    fn image_source_builds_a_mip_chain() {
        let img = RgbaImage::from_fn(64, 64, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
        let source = ImageTextureSource::from_image(img, 16, true);
        assert_eq!(source.level_count(), 3); // 64, 32, 16
        let tile = source.fetch_tile(Tile::new(0, 0, 1)).unwrap();
        assert_eq!(tile.len(), 16 * 16 * 4);
        // Level 1 pixel (0,0) averages the 2x2 block at the origin.
        assert_eq!(tile[0], 0);
        assert_eq!(&tile[2..4], &[0, 255]);
    }

    #[test]
    fn image_source_wraps_at_the_edges() {
        let img = RgbaImage::from_fn(32, 32, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
        let source = ImageTextureSource::from_image(img, 32, true);
        let a = source.fetch_tile(Tile::new(0, 0, 0)).unwrap();
        let b = source.fetch_tile(Tile::new(1, 1, 0)).unwrap();
        assert_eq!(a, b);
    }
}
