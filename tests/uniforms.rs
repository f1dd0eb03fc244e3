mod common;

use std::sync::Arc;

use glam::Vec3;
use relief::{ClipmapConfig, TextureClipmap};

use common::{settle, CoordSource, RecordingUniforms};

fn clipmap_with_uniforms() -> (TextureClipmap, RecordingUniforms) {
    let config = ClipmapConfig {
        texture_size: 64,
        tile_size: 16,
        ..Default::default()
    };
    let source = Arc::new(CoordSource {
        levels: 3,
        tile_size: 16,
    });
    let mut clip = TextureClipmap::new(source, &config).unwrap();
    let uniforms = RecordingUniforms::default();
    clip.bind_shader(Box::new(uniforms.clone()));
    (clip, uniforms)
}

#[test]
fn binding_publishes_the_static_uniforms() {
    let (clip, uniforms) = clipmap_with_uniforms();
    let store = uniforms.store.lock().unwrap();

    assert_eq!(store.ints["texture"], 0);
    assert_eq!(store.floats["textureDensity"], 1.0);
    assert_eq!(store.floats["textureSize"], 64.0);
    assert_eq!(store.floats["texelSize"], 1.0 / 64.0);
    // Three source levels round up to a four-deep texture array.
    assert_eq!(store.floats["levels"], 4.0);
    assert_eq!(store.floats["validLevels"], 2.0);
    assert_eq!(store.floats["minLevel"], 0.0);
    assert_eq!(store.floats["showDebug"], 0.0);
    assert_eq!(clip.texture_levels(), 4);
}

#[test]
fn updates_publish_eye_and_slice_offsets() {
    let (mut clip, uniforms) = clipmap_with_uniforms();
    let eye = Vec3::new(5.0, 10.0, 7.0);
    settle(&mut clip, eye);

    let store = uniforms.store.lock().unwrap();
    assert_eq!(store.vec3s["eyePosition"], eye);
    // One (u, v) pair per texture array layer.
    assert_eq!(store.arrays["sliceOffset"].len(), clip.texture_levels() * 2);
    assert_eq!(store.floats["minLevel"], 0.0);
    assert_eq!(store.vec4s["tint"], glam::Vec4::ONE);
}

#[test]
fn show_debug_is_reflected_at_bind_time() {
    let config = ClipmapConfig {
        texture_size: 64,
        tile_size: 16,
        ..Default::default()
    };
    let source = Arc::new(CoordSource {
        levels: 1,
        tile_size: 16,
    });
    let mut clip = TextureClipmap::new(source, &config).unwrap();
    clip.set_show_debug(true);
    let uniforms = RecordingUniforms::default();
    clip.bind_shader(Box::new(uniforms.clone()));
    assert_eq!(uniforms.store.lock().unwrap().floats["showDebug"], 1.0);
}
