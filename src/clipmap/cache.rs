use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::source::TextureSource;
use crate::utils::math::modulo;

use super::mailbox::Mailbox;
use super::region::{Region, Tile};

/// Per-level tile cache.
///
/// Owns residency and validity bookkeeping for one clipmap level. Tile
/// fetches run on the rayon pool, fire-and-forget; workers only touch the
/// shared cache state and the mailbox, never the engine. The render thread
/// observes progress through [`TextureCache::is_valid`],
/// [`TextureCache::handle_update_requests`] and the mailbox.
pub struct TextureCache {
    level: usize,
    texture_size: i32,
    tile_size: i32,
    color_bytes: usize,
    margin_tiles: i32,
    source: Arc<dyn TextureSource>,
    mailbox: Arc<Mailbox>,
    state: Arc<CacheState>,
    /// Last window center handed to the cache. Render thread only.
    position: Option<(i32, i32)>,
}

struct CacheState {
    inner: Mutex<CacheInner>,
    valid: AtomicBool,
    generation: AtomicU64,
}

#[derive(Default)]
struct CacheInner {
    tiles: HashMap<Tile, Vec<u8>>,
    pending: HashSet<Tile>,
    updated: HashSet<Tile>,
    needed: HashSet<Tile>,
    keep: HashSet<Tile>,
}

impl TextureCache {
    pub(crate) fn new(
        level: usize,
        texture_size: i32,
        tile_size: i32,
        color_bytes: usize,
        margin_tiles: i32,
        source: Arc<dyn TextureSource>,
        mailbox: Arc<Mailbox>,
    ) -> Self {
        Self {
            level,
            texture_size,
            tile_size,
            color_bytes,
            margin_tiles,
            source,
            mailbox,
            state: Arc::new(CacheState {
                inner: Mutex::new(CacheInner::default()),
                valid: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
            position: None,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// True once every tile of the current window has been resident at least
    /// once. Resident-but-stale data keeps a level valid; only repositioning
    /// can invalidate it again.
    pub fn is_valid(&self) -> bool {
        self.state.valid.load(Ordering::Acquire)
    }

    /// Informs the cache that the window center moved to `(x, y)` (level
    /// pixel units). Spawns fetches for newly needed tiles and evicts tiles
    /// outside the margin. Never blocks on the backing store.
    pub fn set_current_position(&mut self, x: i32, y: i32) {
        if self.position == Some((x, y)) {
            return;
        }
        self.position = Some((x, y));

        let half = self.texture_size / 2;
        let tile_min_x = (x - half).div_euclid(self.tile_size);
        let tile_max_x = (x + half - 1).div_euclid(self.tile_size);
        let tile_min_y = (y - half).div_euclid(self.tile_size);
        let tile_max_y = (y + half - 1).div_euclid(self.tile_size);
        let m = self.margin_tiles;

        let mut needed = HashSet::new();
        let mut keep = HashSet::new();
        for ty in tile_min_y - m..=tile_max_y + m {
            for tx in tile_min_x - m..=tile_max_x + m {
                let tile = Tile::new(tx, ty, self.level);
                keep.insert(tile);
                if (tile_min_x..=tile_max_x).contains(&tx)
                    && (tile_min_y..=tile_max_y).contains(&ty)
                {
                    needed.insert(tile);
                }
            }
        }

        let generation = self.state.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut inner = self.state.inner.lock().unwrap();
        inner.tiles.retain(|tile, _| keep.contains(tile));
        inner.pending.retain(|tile| keep.contains(tile));
        inner.updated.retain(|tile| keep.contains(tile));

        let missing: Vec<Tile> = keep
            .iter()
            .filter(|tile| !inner.tiles.contains_key(tile) && !inner.pending.contains(tile))
            .copied()
            .collect();
        for tile in &missing {
            inner.pending.insert(*tile);
        }
        let valid = needed.iter().all(|tile| inner.tiles.contains_key(tile));
        self.state.valid.store(valid, Ordering::Release);
        inner.needed = needed;
        inner.keep = keep;
        drop(inner);

        debug!(
            level = self.level,
            x, y, fetches = missing.len(), "cache repositioned"
        );
        for tile in missing {
            self.spawn_fetch(tile, generation);
        }
    }

    fn spawn_fetch(&self, tile: Tile, generation: u64) {
        let state = Arc::clone(&self.state);
        let source = Arc::clone(&self.source);
        let mailbox = Arc::clone(&self.mailbox);
        let tile_size = self.tile_size;
        let expected = (tile_size * tile_size) as usize * self.color_bytes;
        rayon::spawn(move || {
            let data = source.fetch_tile(tile);
            let mut inner = state.inner.lock().unwrap();
            inner.pending.remove(&tile);
            // A fetch from an older reposition still lands if the tile is
            // wanted by the current window; otherwise the result is stale.
            let current = state.generation.load(Ordering::Acquire) == generation;
            if !current && !inner.keep.contains(&tile) {
                return;
            }
            match data {
                Some(data) if data.len() == expected => {
                    inner.tiles.insert(tile, data);
                    inner.updated.insert(tile);
                    mailbox.post(Region::new(
                        tile.level,
                        tile.x * tile_size,
                        tile.y * tile_size,
                        tile_size,
                        tile_size,
                    ));
                    // The post and the validity flip stay under the lock:
                    // both writers of `valid` are serialized by it, and a
                    // reader that sees a valid cache also finds the posts.
                    if inner.needed.iter().all(|t| inner.tiles.contains_key(t)) {
                        state.valid.store(true, Ordering::Release);
                    }
                }
                Some(data) => {
                    warn!(
                        ?tile,
                        got = data.len(),
                        expected,
                        "tile data has the wrong size, dropping"
                    );
                }
                None => {
                    debug!(?tile, "tile unavailable");
                }
            }
        });
    }

    /// Synchronous toroidal copy from resident tiles into `dst`.
    ///
    /// Source coordinates are absolute per-level pixel coordinates;
    /// destination coordinates wrap modulo the texture size, with spans split
    /// at the boundary. Non-resident tiles copy nothing.
    pub fn update_region(
        &self,
        dst: &mut [u8],
        src_x: i32,
        src_y: i32,
        dst_x: i32,
        dst_y: i32,
        width: i32,
        height: i32,
    ) {
        let ts = self.texture_size;
        let cb = self.color_bytes as i32;
        let inner = self.state.inner.lock().unwrap();
        for row in 0..height {
            let sy = src_y + row;
            let dy = modulo(dst_y + row, ts);
            let tile_y = sy.div_euclid(self.tile_size);
            let local_y = modulo(sy, self.tile_size);
            let mut col = 0;
            while col < width {
                let sx = src_x + col;
                let dx = modulo(dst_x + col, ts);
                let tile_x = sx.div_euclid(self.tile_size);
                let local_x = modulo(sx, self.tile_size);
                let run = (width - col)
                    .min(self.tile_size - local_x)
                    .min(ts - dx);
                if let Some(data) = inner.tiles.get(&Tile::new(tile_x, tile_y, self.level)) {
                    let src_off = ((local_y * self.tile_size + local_x) * cb) as usize;
                    let dst_off = ((dy * ts + dx) * cb) as usize;
                    let len = (run * cb) as usize;
                    dst[dst_off..dst_off + len].copy_from_slice(&data[src_off..src_off + len]);
                }
                col += run;
            }
        }
    }

    /// Drains and returns the tiles refreshed since the last call.
    pub fn handle_update_requests(&self) -> Option<HashSet<Tile>> {
        let mut inner = self.state.inner.lock().unwrap();
        if inner.updated.is_empty() {
            None
        } else {
            Some(mem::take(&mut inner.updated))
        }
    }
}
