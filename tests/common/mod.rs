#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use glam::{Vec3, Vec4};
use relief::{NullRenderer, Renderer, ShaderUniforms, TextureClipmap, TextureSource, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upload {
    pub dst_x: u32,
    pub dst_y: u32,
    pub layer: u32,
    pub width: u32,
    pub height: u32,
}

/// Renderer that records every sub-image upload.
#[derive(Default)]
pub struct RecordingRenderer {
    pub uploads: Vec<Upload>,
}

impl Renderer for RecordingRenderer {
    fn update_texture_sub_image(
        &mut self,
        dst_x: u32,
        dst_y: u32,
        layer: u32,
        width: u32,
        height: u32,
        _data: &[u8],
        _src_x: u32,
        _src_y: u32,
        _row_length: u32,
    ) {
        self.uploads.push(Upload {
            dst_x,
            dst_y,
            layer,
            width,
            height,
        });
    }
}

#[derive(Default)]
pub struct UniformStore {
    pub ints: HashMap<String, i32>,
    pub floats: HashMap<String, f32>,
    pub vec3s: HashMap<String, Vec3>,
    pub vec4s: HashMap<String, Vec4>,
    pub arrays: HashMap<String, Vec<f32>>,
}

/// Uniform sink whose store stays shared with the test after the clipmap
/// takes ownership of the boxed clone.
#[derive(Default, Clone)]
pub struct RecordingUniforms {
    pub store: Arc<Mutex<UniformStore>>,
}

impl ShaderUniforms for RecordingUniforms {
    fn set_i32(&mut self, name: &str, value: i32) {
        self.store.lock().unwrap().ints.insert(name.to_string(), value);
    }
    fn set_f32(&mut self, name: &str, value: f32) {
        self.store.lock().unwrap().floats.insert(name.to_string(), value);
    }
    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.store.lock().unwrap().vec3s.insert(name.to_string(), value);
    }
    fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.store.lock().unwrap().vec4s.insert(name.to_string(), value);
    }
    fn set_f32_array(&mut self, name: &str, values: &[f32]) {
        self.store
            .lock()
            .unwrap()
            .arrays
            .insert(name.to_string(), values.to_vec());
    }
}

/// Source whose red/green channels encode the absolute pixel coordinate and
/// whose blue channel encodes the level.
pub struct CoordSource {
    pub levels: usize,
    pub tile_size: i32,
}

impl TextureSource for CoordSource {
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
        let ts = self.tile_size;
        let mut data = Vec::with_capacity((ts * ts) as usize * 3);
        for y in 0..ts {
            for x in 0..ts {
                data.push((tile.x * ts + x) as u8);
                data.push((tile.y * ts + y) as u8);
                data.push(tile.level as u8);
            }
        }
        Some(data)
    }
}

/// Pumps updates until every level validates, then flushes the pending tile
/// refreshes and one mailbox drain so subsequent updates start from a clean
/// state.
pub fn settle(clip: &mut TextureClipmap, eye: Vec3) {
    let mut renderer = NullRenderer;
    for _ in 0..5000 {
        clip.update(&mut renderer, eye);
        if (0..clip.valid_levels()).all(|l| clip.is_level_valid(l)) {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert!(
        (0..clip.valid_levels()).all(|l| clip.is_level_valid(l)),
        "clipmap never fully validated"
    );
    // Absorb late margin-tile completions, then one throttle interval so the
    // mailbox drains.
    for _ in 0..50 {
        clip.update(&mut renderer, eye);
        thread::sleep(Duration::from_millis(2));
    }
    thread::sleep(Duration::from_millis(350));
    clip.update(&mut renderer, eye);
    clip.update(&mut renderer, eye);
}
