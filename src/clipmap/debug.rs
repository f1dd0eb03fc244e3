use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::info;

use super::error::Result;
use super::TextureClipmap;

impl TextureClipmap {
    /// Writes every level's resident slice as `clipmap_level_<n>.png` into
    /// `dir`, in physical (toroidal) buffer order. Debugging aid; the seams
    /// in the dumped images show where the write cursor currently sits.
    pub fn dump_slices(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let ts = self.texture_size as u32;
        let cb = self.color_bytes;
        for level in &self.levels {
            let img = RgbaImage::from_fn(ts, ts, |x, y| {
                let off = ((y * ts + x) as usize) * cb;
                let px = &level.slice[off..off + cb];
                if cb == 4 {
                    Rgba([px[0], px[1], px[2], px[3]])
                } else {
                    Rgba([px[0], px[1], px[2], 255])
                }
            });
            let path = dir.join(format!("clipmap_level_{}.png", level.level));
            img.save(&path)?;
            info!("wrote {}", path.display());
        }
        Ok(())
    }
}
