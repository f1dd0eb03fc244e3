use std::collections::HashSet;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use tracing::info;

use crate::render::{Renderer, ShaderUniforms};
use crate::source::TextureSource;
use crate::utils::math::{modulo, modulo_f32, modulo_i64, round_up_pow2};
use crate::utils::timer::Timer;

pub mod cache;
pub mod config;
mod debug;
pub mod error;
pub mod level;
pub mod mailbox;
pub mod region;

use cache::TextureCache;
use config::ClipmapConfig;
use error::{Error, Result};
use level::LevelData;
use mailbox::Mailbox;
use region::Region;

/// Multi-level toroidal texture clipmap.
///
/// Keeps one `texture_size`-squared pixel window per resolution level
/// resident in CPU buffers and mirrored into a layered GPU texture,
/// recentered on the eye position each frame. Updates are incremental: an
/// anchor shift patches only the newly exposed strips, and background tile
/// refreshes arrive through the mailbox and are applied in a throttled drain
/// pass.
pub struct TextureClipmap {
    source: Arc<dyn TextureSource>,
    texture_size: i32,
    texture_levels: usize,
    valid_levels: usize,
    current_shown_levels: usize,
    min_visible_level: usize,
    density: f32,

    levels: Vec<LevelData>,
    caches: Vec<TextureCache>,
    mailbox: Arc<Mailbox>,

    eye_position: Vec3,
    scaled_eye: Vec3,
    slice_offsets: Vec<Vec2>,
    shader: Option<Box<dyn ShaderUniforms>>,

    show_debug: bool,
    enabled: bool,
    color_bytes: usize,

    update_timer: u64,
    update_interval: u64,
    throttle: Timer,
}

impl TextureClipmap {
    pub fn new(source: Arc<dyn TextureSource>, config: &ClipmapConfig) -> Result<Self> {
        config.validate()?;
        let valid_levels = source.level_count();
        if valid_levels == 0 {
            return Err(Error::Config("texture source has no levels".to_string()));
        }
        if source.tile_size() != config.tile_size {
            return Err(Error::Config(format!(
                "source tile size {} does not match configured tile size {}",
                source.tile_size(),
                config.tile_size
            )));
        }

        let texture_size = config.texture_size;
        let texture_levels = round_up_pow2(valid_levels);
        let color_bytes = config.color_bytes();

        info!("texture size: {}", texture_size);
        info!("valid levels: {}", valid_levels);
        info!("texture array depth: {}", texture_levels);

        let mailbox = Arc::new(Mailbox::new());
        let levels = (0..valid_levels)
            .map(|i| LevelData::new(i, texture_size, color_bytes))
            .collect();
        let caches = (0..valid_levels)
            .map(|i| {
                TextureCache::new(
                    i,
                    texture_size,
                    config.tile_size,
                    color_bytes,
                    config.cache_margin_tiles,
                    Arc::clone(&source),
                    Arc::clone(&mailbox),
                )
            })
            .collect();

        let mut throttle = Timer::new();
        throttle.start();

        Ok(Self {
            source,
            texture_size,
            texture_levels,
            valid_levels,
            current_shown_levels: valid_levels - 1,
            min_visible_level: 0,
            density: config.texture_density,
            levels,
            caches,
            mailbox,
            eye_position: Vec3::ZERO,
            scaled_eye: Vec3::ZERO,
            slice_offsets: vec![Vec2::ZERO; texture_levels],
            shader: None,
            show_debug: false,
            enabled: true,
            color_bytes,
            update_timer: 0,
            update_interval: config.update_interval_ms,
            throttle,
        })
    }

    /// Per-frame entry point; render thread only, never blocks.
    pub fn update(&mut self, renderer: &mut dyn Renderer, position: Vec3) {
        if !self.enabled {
            return;
        }

        self.eye_position = position;
        if let Some(shader) = self.shader.as_mut() {
            shader.set_vec3("eyePosition", position);
        }
        let eye = position * self.density;
        self.scaled_eye = eye;

        let ts = self.texture_size;
        let mut shown: i32 = -1;
        for unit in self.min_visible_level..self.valid_levels {
            let exp2 = (1u64 << unit) as f32;
            let fx = eye.x / exp2;
            let fy = eye.z / exp2;
            let off_x = fx.floor() as i32;
            let off_y = fy.floor() as i32;

            if !self.caches[unit].is_valid() {
                // Not displayable yet; steer the fetches and keep scanning
                // coarser levels for a fallback.
                shown = -1;
                self.caches[unit].set_current_position(off_x, off_y);
                continue;
            }

            if shown == -1 {
                shown = unit as i32;
            }

            if self.levels[unit].x != off_x || self.levels[unit].y != off_y {
                self.caches[unit].set_current_position(off_x, off_y);
                self.update_level(renderer, unit, off_x, off_y);
            }

            // Tiles refreshed in the background within the current window.
            if self.caches[unit].handle_update_requests().is_some() {
                let s_x = off_x - ts / 2;
                let s_y = off_y - ts / 2;
                let d_x = self.levels[unit].offset_x;
                let d_y = self.levels[unit].offset_y;
                // TODO: narrow this to the changed sub-rectangle of each tile
                // instead of re-copying the whole level.
                self.update_quick(
                    renderer,
                    unit,
                    (ts + 1) as i64,
                    (ts + 1) as i64,
                    s_x,
                    s_y,
                    d_x,
                    d_y,
                    ts,
                    ts,
                );
            }

            // Texcoord shift for the shader, torus-aware.
            let level = &self.levels[unit];
            let shift_x = modulo(level.x, 2) as f32;
            let shift_y = modulo(level.y, 2) as f32;
            let u = (modulo_f32(fx, 2.0) - shift_x + level.offset_x as f32) / ts as f32;
            let v = (modulo_f32(fy, 2.0) - shift_y + level.offset_y as f32) / ts as f32;
            self.slice_offsets[unit] = Vec2::new(u, v);
        }

        self.current_shown_levels = if shown < 0 {
            self.valid_levels - 1
        } else {
            shown as usize
        };

        if let Some(shader) = self.shader.as_mut() {
            shader.set_f32_array("sliceOffset", bytemuck::cast_slice(&self.slice_offsets));
            shader.set_f32("minLevel", self.current_shown_levels as f32);
            shader.set_vec4("tint", self.source.tint_color());
        }

        self.update_from_mailbox(renderer);
    }

    /// Forces a full re-copy and upload of every level, e.g. after the
    /// backing data changed wholesale.
    pub fn regenerate(&mut self, renderer: &mut dyn Renderer) {
        let ts = self.texture_size;
        for unit in (0..self.valid_levels).rev() {
            let exp2 = (1u64 << unit) as f32;
            let off_x = (self.scaled_eye.x / exp2).floor() as i32;
            let off_y = (self.scaled_eye.z / exp2).floor() as i32;
            let d_x = self.levels[unit].offset_x;
            let d_y = self.levels[unit].offset_y;
            self.update_quick(
                renderer,
                unit,
                (ts + 1) as i64,
                (ts + 1) as i64,
                off_x - ts / 2,
                off_y - ts / 2,
                d_x,
                d_y,
                ts,
                ts,
            );
        }
    }

    fn update_level(&mut self, renderer: &mut dyn Renderer, unit: usize, x: i32, y: i32) {
        let ts = self.texture_size;
        let (diff_x, diff_y, d_x, d_y) = {
            let level = &mut self.levels[unit];
            let diff_x = x as i64 - level.x as i64;
            let diff_y = y as i64 - level.y as i64;
            level.x = x;
            level.y = y;
            level.offset_x = modulo_i64(level.offset_x as i64 + diff_x, ts as i64) as i32;
            level.offset_y = modulo_i64(level.offset_y as i64 + diff_y, ts as i64) as i32;
            (diff_x, diff_y, level.offset_x, level.offset_y)
        };
        self.update_quick(
            renderer,
            unit,
            diff_x,
            diff_y,
            x - ts / 2,
            y - ts / 2,
            d_x,
            d_y,
            ts,
            ts,
        );
    }

    /// Minimal GPU patch for an anchor delta: the whole window when the move
    /// exceeds the buffer, otherwise one strip per moved axis, each written
    /// at the wrapped destination and split into head/tail uploads when the
    /// span crosses the toroidal boundary.
    #[allow(clippy::too_many_arguments)]
    fn update_quick(
        &mut self,
        renderer: &mut dyn Renderer,
        unit: usize,
        diff_x: i64,
        diff_y: i64,
        s_x: i32,
        s_y: i32,
        d_x: i32,
        d_y: i32,
        width: i32,
        height: i32,
    ) {
        let ts = self.texture_size;
        let cache = &self.caches[unit];
        let level = &mut self.levels[unit];

        if diff_x.abs() > ts as i64 || diff_y.abs() > ts as i64 {
            // Moved farther than the buffer covers in one step.
            cache.update_region(&mut level.slice, s_x, s_y, d_x, d_y, width, height);
            renderer.update_texture_sub_image(
                0,
                0,
                unit as u32,
                ts as u32,
                ts as u32,
                &level.slice,
                0,
                0,
                ts as u32,
            );
            return;
        }

        let diff_x = diff_x as i32;
        let diff_y = diff_y as i32;

        if diff_x != 0 {
            // Newly exposed columns. The strip spans the full height, which
            // also covers the corner when both axes moved.
            let (mut sx, mut dx) = (s_x, d_x);
            if diff_x > 0 {
                sx = s_x + ts - diff_x;
                dx = d_x - diff_x;
            }
            let w = diff_x.abs();
            cache.update_region(&mut level.slice, sx, s_y, dx, d_y, w, height);
            upload_columns(renderer, unit, &level.slice, ts, dx, w);
        }

        if diff_y != 0 {
            // Newly exposed rows.
            let (mut sy, mut dy) = (s_y, d_y);
            if diff_y > 0 {
                sy = s_y + ts - diff_y;
                dy = d_y - diff_y;
            }
            let h = diff_y.abs();
            cache.update_region(&mut level.slice, s_x, sy, d_x, dy, width, h);
            upload_rows(renderer, unit, &level.slice, ts, dy, h);
        }
    }

    /// Throttled drain of the dirty-region mailbox.
    fn update_from_mailbox(&mut self, renderer: &mut dyn Renderer) {
        self.tick_throttle();
        if self.update_timer < self.update_interval {
            return;
        }

        let mut regions = self.mailbox.switch_and_get();
        if !regions.is_empty() {
            let ts = self.texture_size;
            for level in self.levels.iter_mut() {
                level.clip_region.x = level.x - ts / 2;
                level.clip_region.y = level.y - ts / 2;
            }
            let clips: Vec<Region> = self.levels.iter().map(|l| l.clip_region).collect();

            filter_and_clip(&mut regions, &clips);
            regions.sort_by_key(|r| r.level);

            // A coarse-level change also invalidates the finer levels that
            // overlay it.
            let initial = regions.len();
            for i in (0..initial).rev() {
                let r = regions[i];
                recursive_add_updates(&mut regions, r.level, r.x, r.y, r.width, r.height);
            }

            filter_and_clip(&mut regions, &clips);
            regions.sort_by_key(|r| r.level);

            let mut affected: HashSet<usize> = HashSet::new();
            for region in regions.iter().rev() {
                affected.insert(region.level);
                let cache = &self.caches[region.level];
                let level = &mut self.levels[region.level];
                // Longstanding quirk, kept on purpose: the drain writes one
                // pixel past the cursor mapping the shift path uses. The
                // full-level upload below covers either placement.
                let d_x = modulo(region.x + ts / 2, ts);
                let d_y = modulo(region.y + ts / 2, ts);
                cache.update_region(
                    &mut level.slice,
                    region.x,
                    region.y,
                    d_x + 1,
                    d_y + 1,
                    region.width,
                    region.height,
                );
            }

            for unit in affected {
                // TODO: upload only the sub-rectangle the regions touched.
                let slice = &self.levels[unit].slice;
                renderer.update_texture_sub_image(
                    0,
                    0,
                    unit as u32,
                    ts as u32,
                    ts as u32,
                    slice,
                    0,
                    0,
                    ts as u32,
                );
            }
        }

        // Carry the fractional overshoot into the next interval.
        self.update_timer %= self.update_interval;
    }

    fn tick_throttle(&mut self) {
        self.update_timer += self.throttle.elapsed_ms() as u64;
        self.throttle.start();
    }

    /// Installs the uniform sink and publishes the static uniforms.
    pub fn bind_shader(&mut self, mut shader: Box<dyn ShaderUniforms>) {
        shader.set_i32("texture", 0);
        shader.set_f32("textureDensity", self.density);
        shader.set_f32("textureSize", self.texture_size as f32);
        shader.set_f32("texelSize", 1.0 / self.texture_size as f32);
        shader.set_f32("levels", self.texture_levels as f32);
        shader.set_f32("validLevels", (self.valid_levels - 1) as f32);
        shader.set_f32("minLevel", 0.0);
        shader.set_f32("showDebug", if self.show_debug { 1.0 } else { 0.0 });
        self.shader = Some(shader);
    }

    pub fn texture_size(&self) -> i32 {
        self.texture_size
    }

    pub fn texture_levels(&self) -> usize {
        self.texture_levels
    }

    pub fn valid_levels(&self) -> usize {
        self.valid_levels
    }

    /// The coarsest valid level found by the last update; the shader's
    /// minimum-detail fallback.
    pub fn current_shown_levels(&self) -> usize {
        self.current_shown_levels
    }

    pub fn is_level_valid(&self, level: usize) -> bool {
        self.caches.get(level).is_some_and(|c| c.is_valid())
    }

    /// Sets the finest level considered for display, clamped to the valid
    /// range.
    pub fn set_min_visible_level(&mut self, level: usize) {
        self.min_visible_level = level.min(self.valid_levels - 1);
    }

    pub fn min_visible_level(&self) -> usize {
        self.min_visible_level
    }

    pub fn pixel_density(&self) -> f32 {
        self.density
    }

    pub fn set_pixel_density(&mut self, density: f32) {
        self.density = density;
    }

    /// True (default) if this clipmap should stream and upload.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_show_debug(&self) -> bool {
        self.show_debug
    }

    pub fn set_show_debug(&mut self, show_debug: bool) {
        self.show_debug = show_debug;
    }

    pub fn source(&self) -> &Arc<dyn TextureSource> {
        &self.source
    }

    /// The shared dirty-region mailbox; external producers may post to it.
    pub fn mailbox(&self) -> Arc<Mailbox> {
        Arc::clone(&self.mailbox)
    }
}

fn upload_columns(
    renderer: &mut dyn Renderer,
    unit: usize,
    slice: &[u8],
    ts: i32,
    d_x: i32,
    width: i32,
) {
    let d_x = modulo(d_x, ts);
    if d_x + width > ts {
        let head = ts - d_x;
        renderer.update_texture_sub_image(
            d_x as u32,
            0,
            unit as u32,
            head as u32,
            ts as u32,
            slice,
            d_x as u32,
            0,
            ts as u32,
        );
        renderer.update_texture_sub_image(
            0,
            0,
            unit as u32,
            (width - head) as u32,
            ts as u32,
            slice,
            0,
            0,
            ts as u32,
        );
    } else {
        renderer.update_texture_sub_image(
            d_x as u32,
            0,
            unit as u32,
            width as u32,
            ts as u32,
            slice,
            d_x as u32,
            0,
            ts as u32,
        );
    }
}

fn upload_rows(
    renderer: &mut dyn Renderer,
    unit: usize,
    slice: &[u8],
    ts: i32,
    d_y: i32,
    height: i32,
) {
    let d_y = modulo(d_y, ts);
    if d_y + height > ts {
        let head = ts - d_y;
        renderer.update_texture_sub_image(
            0,
            d_y as u32,
            unit as u32,
            ts as u32,
            head as u32,
            slice,
            0,
            d_y as u32,
            ts as u32,
        );
        renderer.update_texture_sub_image(
            0,
            0,
            unit as u32,
            ts as u32,
            (height - head) as u32,
            slice,
            0,
            0,
            ts as u32,
        );
    } else {
        renderer.update_texture_sub_image(
            0,
            d_y as u32,
            unit as u32,
            ts as u32,
            height as u32,
            slice,
            0,
            d_y as u32,
            ts as u32,
        );
    }
}

fn filter_and_clip(regions: &mut Vec<Region>, clips: &[Region]) {
    regions.retain_mut(|region| {
        let clip = &clips[region.level];
        if clip.intersects(region) {
            region.intersect(clip);
            true
        } else {
            false
        }
    });
}

fn recursive_add_updates(
    regions: &mut Vec<Region>,
    level: usize,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) {
    if level == 0 {
        return;
    }
    // The same area at double resolution, one level finer.
    let region = Region::new(level - 1, x * 2, y * 2, width * 2, height * 2);
    if !regions.contains(&region) {
        regions.push(region);
        recursive_add_updates(
            regions,
            region.level,
            region.x,
            region.y,
            region.width,
            region.height,
        );
    }
}
