//! Caption model
//!
//! Holds the caption assets for one video section and the index of the
//! caption currently on screen. The index is advanced by the caption
//! stream thread and read by the render thread.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::captions::script::{CaptionScript, Speaker};

/// One displayable caption
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionAsset {
    pub text: String,
    pub speaker: Speaker,
    pub message_id: i64,
    pub chunk_id: i64,
    /// Pre-rendered caption bitmap, when a bitmap directory is configured
    pub bitmap: Option<PathBuf>,
}

/// Bitmap path for caption `index` at `blur_level`: `{dir}/{index}.{blur}.png`
pub fn bitmap_path(dir: &Path, index: usize, blur_level: u32) -> PathBuf {
    dir.join(format!("{}.{}.png", index, blur_level))
}

/// Caption assets plus the shared "current caption" cursor
#[derive(Debug)]
pub struct CaptionModel {
    captions: Vec<CaptionAsset>,
    index: AtomicUsize,
}

impl CaptionModel {
    /// Build text-only captions from a script
    pub fn from_script(script: &CaptionScript) -> Self {
        let captions = script
            .records
            .iter()
            .map(|r| CaptionAsset {
                text: r.text.clone(),
                speaker: r.speaker,
                message_id: r.message_id,
                chunk_id: r.chunk_id,
                bitmap: None,
            })
            .collect();
        Self::new(captions)
    }

    /// Build captions backed by bitmaps.
    ///
    /// Bitmaps are looked up in script order and loading stops at the first
    /// missing file, so the model may hold fewer captions than the script.
    pub fn with_bitmaps(script: &CaptionScript, dir: &Path, blur_level: u32) -> Self {
        let mut captions = Vec::with_capacity(script.len());
        for (i, r) in script.records.iter().enumerate() {
            let path = bitmap_path(dir, i, blur_level);
            if !path.exists() {
                tracing::warn!(
                    "Caption bitmap {} not found; loaded {} of {} captions",
                    path.display(),
                    i,
                    script.len()
                );
                break;
            }
            captions.push(CaptionAsset {
                text: r.text.clone(),
                speaker: r.speaker,
                message_id: r.message_id,
                chunk_id: r.chunk_id,
                bitmap: Some(path),
            });
        }
        Self::new(captions)
    }

    pub fn new(captions: Vec<CaptionAsset>) -> Self {
        Self {
            captions,
            index: AtomicUsize::new(0),
        }
    }

    /// Caption currently on screen, `None` once the script has finished
    pub fn current(&self) -> Option<&CaptionAsset> {
        self.captions.get(self.index.load(Ordering::Acquire))
    }

    /// Move to the next caption, returning the new index
    pub fn advance(&self) -> usize {
        let len = self.captions.len();
        let previous = self
            .index
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| {
                (i < len).then_some(i + 1)
            })
            .unwrap_or(len);
        (previous + 1).min(len)
    }

    pub fn position(&self) -> usize {
        self.index.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.position() >= self.captions.len()
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CaptionAsset> {
        self.captions.get(index)
    }
}
