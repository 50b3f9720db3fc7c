//! Procedural cherry-blossom tree
//!
//! A seeded recursive generator grows a tree of branches and flower clusters,
//! which is painted once into an off-screen raster. Each frame composites
//! that raster, swaying gently in a synthetic breeze, under a pool of
//! falling petals. Everything renders in software into [`display::PixelBuffer`].

pub mod display;
pub mod effects;
pub mod error;
pub mod math2d;
pub mod mqtt;
pub mod perf;
pub mod theme;
pub mod util;

pub use error::{Result, SakuraError};
