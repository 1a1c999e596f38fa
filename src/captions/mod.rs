//! Caption playback
//!
//! - Caption script parsing and inter-caption delays
//! - Caption model with the shared current-caption cursor
//! - Caption advance worker gated on playback start

pub mod model;
pub mod script;
pub mod stream;

pub use model::{bitmap_path, CaptionAsset, CaptionModel};
pub use script::{CaptionRecord, CaptionScript, Speaker};
pub use stream::{run_caption_stream, CaptionStream, CaptionStreamReport};
