use super::region::Region;

/// Mutable per-level clipmap state.
///
/// Each level owns exactly one pixel buffer for its lifetime; the buffer is
/// never reallocated, only overwritten in place. `offset_x`/`offset_y` are the
/// toroidal write cursor and always stay within `[0, texture_size)`. The
/// anchor `(x, y)` tracks the logical window center in level-local pixel
/// units; the invariant `offset ≡ anchor (mod texture_size)` ties the two
/// addressing schemes together.
pub struct LevelData {
    pub level: usize,
    pub x: i32,
    pub y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub slice: Vec<u8>,
    /// Scratch rectangle recomputed on every mailbox drain; holds the level's
    /// currently valid window in absolute per-level pixel coordinates.
    pub clip_region: Region,
}

impl LevelData {
    pub fn new(level: usize, texture_size: i32, color_bytes: usize) -> Self {
        let bytes = texture_size as usize * texture_size as usize * color_bytes;
        Self {
            level,
            x: 0,
            y: 0,
            offset_x: 0,
            offset_y: 0,
            slice: vec![0; bytes],
            clip_region: Region::new(level, 0, 0, texture_size, texture_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_is_sized_for_the_window() {
        let level = LevelData::new(1, 64, 3);
        assert_eq!(level.slice.len(), 64 * 64 * 3);
        assert_eq!(level.clip_region, Region::new(1, 0, 0, 64, 64));
        assert_eq!((level.offset_x, level.offset_y), (0, 0));
    }
}
