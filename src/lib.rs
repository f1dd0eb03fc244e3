//! Texture clipmap streaming core for a real-time terrain renderer.
//!
//! The crate keeps a bounded-memory, per-level toroidal window of a much
//! larger terrain texture resident and mirrored into a layered GPU texture,
//! recentered on a moving eye position and refreshed incrementally. Tile
//! fetches run on background workers; the render thread only ever patches
//! the strips and regions that actually changed.
//!
//! The GPU and the backing store are reached through narrow traits
//! ([`render::Renderer`], [`render::ShaderUniforms`],
//! [`source::TextureSource`]), so the core compiles without any particular
//! graphics API.

pub mod clipmap;
pub mod render;
pub mod source;
pub mod terrain;
mod utils;

pub use clipmap::cache::TextureCache;
pub use clipmap::config::ClipmapConfig;
pub use clipmap::error::Error as ClipmapError;
pub use clipmap::mailbox::Mailbox;
pub use clipmap::region::{Region, Tile};
pub use clipmap::TextureClipmap;
pub use render::{NullRenderer, Renderer, ShaderUniforms};
pub use source::{
    CheckerTextureSource, FlatHeightSource, HeightSource, ImageTextureSource, TextureSource,
};
pub use terrain::{Terrain, TerrainInfo};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a default fmt subscriber at INFO level.
///
/// Convenience for applications and tests that have no subscriber of their
/// own; does nothing if one is already set.
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
