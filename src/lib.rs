#![forbid(unsafe_code)]

pub mod anim;
pub mod config;
pub mod error;
pub mod geom;
pub mod pixel;
pub mod pool;
pub mod present;
pub mod raster;
pub mod sprite;
pub mod stage;
mod ticker;

pub use anim::{AnimationSpec, DynamicAnimation, FrameClock, StaticAnimation};
pub use config::StageConfig;
pub use error::{StageError, StageResult};
pub use geom::{Point, Rect, Size};
pub use pixel::PixelBuf;
pub use pool::{Handle, Pool};
pub use present::{MemoryTarget, PresentTarget};
pub use raster::{RasterImage, decode_image};
pub use sprite::{Picture, PictureSpec, Surface, SurfaceSpec};
pub use stage::{DrawPass, Stage};
