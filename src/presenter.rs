//! Caption placement
//!
//! Turns the current caption plus the projected orientation into a
//! [`Placement`] and hands it to a drawing surface. Registered captions are
//! pinned under their speaker; following captions ride the projected pixel.

use crate::captions::CaptionAsset;
use crate::config::{PresentationMethod, Rgba, SessionConfig, SpeakerPositions};

/// How a placement was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Fractional speaker position resolved against the surface
    Pinned,
    /// Projected orientation pixel
    Following,
}

/// Off-screen direction indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Left,
    Right,
}

/// Where and how to draw one caption
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub anchor: Anchor,
    pub arrow: Option<Arrow>,
    /// Opacity of the full-surface contrast mask (0 disables it)
    pub mask_opacity: u8,
    pub foreground: Rgba,
    pub background: Rgba,
}

/// Something captions can be drawn on
pub trait CaptionSurface {
    /// Current drawable size in pixels (width, height)
    fn size(&self) -> (u32, u32);

    fn draw_caption(&mut self, caption: &CaptionAsset, placement: &Placement);
}

/// Surface that only traces what would be drawn
#[derive(Debug, Clone)]
pub struct LogSurface {
    width: u32,
    height: u32,
    drawn: u64,
}

impl LogSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawn: 0,
        }
    }

    /// Captions drawn so far
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl CaptionSurface for LogSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_caption(&mut self, caption: &CaptionAsset, placement: &Placement) {
        self.drawn += 1;
        tracing::trace!(
            x = placement.x,
            y = placement.y,
            anchor = ?placement.anchor,
            arrow = ?placement.arrow,
            mask = placement.mask_opacity,
            speaker = %caption.speaker,
            "draw {:?}",
            caption.text
        );
    }
}

/// Resolves caption placements for one session
#[derive(Debug, Clone)]
pub struct Presenter {
    method: PresentationMethod,
    positions: SpeakerPositions,
    caption_height_fraction: f64,
    foreground: Rgba,
    background: Rgba,
    mask_opacity: u8,
}

impl Presenter {
    pub fn new(method: PresentationMethod, positions: SpeakerPositions) -> Self {
        Self {
            method,
            positions,
            caption_height_fraction: 0.75,
            foreground: Rgba::WHITE,
            background: Rgba::BLACK,
            mask_opacity: 0,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            method: config.presentation,
            positions: config.captions.speaker_positions,
            caption_height_fraction: config.display.caption_height_fraction,
            foreground: config.display.foreground,
            background: config.display.background,
            mask_opacity: config.display.mask_opacity,
        }
    }

    pub fn method(&self) -> PresentationMethod {
        self.method
    }

    /// Placement for `caption`.
    ///
    /// `pixel_x` and `pixel_y` are the projected orientation, ignored for the
    /// registered method. Without `pixel_x` a following caption falls back
    /// to its pinned position; without `pixel_y` it sits at the fixed
    /// caption height.
    pub fn place(
        &self,
        caption: &CaptionAsset,
        pixel_x: Option<i32>,
        pixel_y: Option<i32>,
        width: u32,
        height: u32,
    ) -> Placement {
        match (self.method, pixel_x) {
            (PresentationMethod::Registered, _) | (_, None) => {
                self.pinned(caption, width, height)
            }
            (method, Some(x)) => {
                let y = pixel_y
                    .unwrap_or_else(|| (self.caption_height_fraction * height as f64).round() as i32);
                let (x, arrow) = if method == PresentationMethod::FollowingWithArrows {
                    clamp_with_arrow(x, width)
                } else {
                    (x, None)
                };
                self.placement(x, y, Anchor::Following, arrow)
            }
        }
    }

    /// Pinned placement under the caption's speaker
    pub fn pinned(&self, caption: &CaptionAsset, width: u32, height: u32) -> Placement {
        let pos = self.positions.get(caption.speaker);
        let x = (pos.x * width as f64).round() as i32;
        let y = (pos.y * height as f64).round() as i32;
        self.placement(x, y, Anchor::Pinned, None)
    }

    /// Place and draw the caption, if any
    pub fn present<S: CaptionSurface + ?Sized>(
        &self,
        surface: &mut S,
        caption: Option<&CaptionAsset>,
        pixel_x: Option<i32>,
        pixel_y: Option<i32>,
    ) -> Option<Placement> {
        let caption = caption?;
        let (width, height) = surface.size();
        let placement = self.place(caption, pixel_x, pixel_y, width, height);
        surface.draw_caption(caption, &placement);
        Some(placement)
    }

    fn placement(&self, x: i32, y: i32, anchor: Anchor, arrow: Option<Arrow>) -> Placement {
        Placement {
            x,
            y,
            anchor,
            arrow,
            mask_opacity: self.mask_opacity,
            foreground: self.foreground,
            background: self.background,
        }
    }
}

/// Clamp `x` into `[0, width]`, pointing an arrow at where it really is
fn clamp_with_arrow(x: i32, width: u32) -> (i32, Option<Arrow>) {
    let max = i32::try_from(width).unwrap_or(i32::MAX);
    if x < 0 {
        (0, Some(Arrow::Left))
    } else if x > max {
        (max, Some(Arrow::Right))
    } else {
        (x, None)
    }
}
