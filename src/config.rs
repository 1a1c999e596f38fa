//! Session configuration

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::captions::Speaker;
use crate::error::{CaptionError, Result};
use crate::orientation::{ExponentialParams, FilterPolicy, DEFAULT_CAPACITY};
use crate::projection::{FovBounds, DEFAULT_JIGGLE_THRESHOLD_PX};

/// Field-of-view half angles the experiment supports, in degrees
pub const SUPPORTED_FOV_DEGREES: [u32; 4] = [5, 10, 15, 20];

/// Number of video sections
pub const VIDEO_SECTIONS: u8 = 4;

/// How captions are placed on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationMethod {
    /// Pinned underneath the speaking juror
    #[default]
    Registered,
    /// Follows the viewer's head orientation
    Following,
    /// Follows head orientation and points toward off-screen positions
    FollowingWithArrows,
}

impl PresentationMethod {
    /// Numeric id used on the command line and in the connection string
    pub fn id(&self) -> u8 {
        match self {
            PresentationMethod::Registered => 1,
            PresentationMethod::Following => 2,
            PresentationMethod::FollowingWithArrows => 3,
        }
    }

    pub fn follows_orientation(&self) -> bool {
        !matches!(self, PresentationMethod::Registered)
    }
}

impl std::str::FromStr for PresentationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "1" | "registered" => Ok(PresentationMethod::Registered),
            "2" | "following" => Ok(PresentationMethod::Following),
            "3" | "following-with-arrows" => Ok(PresentationMethod::FollowingWithArrows),
            other => Err(format!("Unknown presentation method: {}", other)),
        }
    }
}

/// RGBA color, written as `"r,g,b,a"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl std::str::FromStr for Rgba {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CaptionError::Config(format!("Invalid color {:?}: {}", s, e)))?;
        match parts.as_slice() {
            [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
            _ => Err(CaptionError::Config(format!(
                "Invalid color {:?}: expected four comma-separated values",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = CaptionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

/// Fractional screen position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where each speaker's pinned caption goes, as fractions of the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpeakerPositions {
    pub juror_a: Position,
    pub juror_b: Position,
    pub juror_c: Position,
    pub jury_foreman: Position,
}

impl SpeakerPositions {
    pub fn get(&self, speaker: Speaker) -> Position {
        match speaker {
            Speaker::JurorA => self.juror_a,
            Speaker::JurorB => self.juror_b,
            Speaker::JurorC => self.juror_c,
            Speaker::JuryForeman => self.jury_foreman,
        }
    }
}

impl Default for SpeakerPositions {
    fn default() -> Self {
        Self {
            juror_a: Position::new(1050.0 / 1920.0, 550.0 / 1080.0),
            juror_b: Position::new(675.0 / 1920.0, 550.0 / 1080.0),
            juror_c: Position::new(197.0 / 1920.0, 650.0 / 1080.0),
            jury_foreman: Position::new(1250.0 / 1920.0, 600.0 / 1080.0),
        }
    }
}

/// Orientation link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrientationConfig {
    /// Address to bind the datagram socket to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Samples retained in the rolling window
    pub window_capacity: usize,

    /// Receive timeout between stop-flag checks, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            window_capacity: DEFAULT_CAPACITY,
            poll_interval_ms: 100,
        }
    }
}

impl OrientationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| CaptionError::Config(format!("Invalid host {:?}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Filter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub policy: FilterPolicy,
    pub exponential: ExponentialParams,
}

/// Projection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Horizontal half angle, in degrees; one of [`SUPPORTED_FOV_DEGREES`]
    pub fov_half_angle_deg: u32,

    /// Azimuth at the screen center, in radians
    pub center_azimuth: f64,

    /// Pixel movement below which the caption stays put
    pub jiggle_threshold_px: f64,

    /// Follow pitch vertically instead of using the fixed caption height
    pub vertical_tracking: bool,

    /// Vertical half angle, in degrees
    pub vertical_half_angle_deg: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_half_angle_deg: 15,
            center_azimuth: 0.0,
            jiggle_threshold_px: DEFAULT_JIGGLE_THRESHOLD_PX,
            vertical_tracking: false,
            vertical_half_angle_deg: 10.0,
        }
    }
}

impl ProjectionConfig {
    pub fn horizontal_bounds(&self) -> FovBounds {
        FovBounds::around(self.center_azimuth, self.fov_half_angle_deg as f64)
    }

    /// Pitch arrives offset by π/2, so level gaze sits at π/2
    pub fn vertical_bounds(&self) -> FovBounds {
        FovBounds::around(FRAC_PI_2, self.vertical_half_angle_deg)
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,

    /// Frame callbacks per second
    pub fps: u32,

    pub foreground: Rgba,
    pub background: Rgba,

    /// Opacity of the contrast mask drawn under captions (0-255)
    pub mask_opacity: u8,

    /// Font used to rasterize captions
    pub font_path: Option<PathBuf>,

    /// Vertical position of following captions, as a fraction of height
    pub caption_height_fraction: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 3840,
            height: 2160,
            fps: 30,
            foreground: Rgba::WHITE,
            background: Rgba::BLACK,
            mask_opacity: 0,
            font_path: None,
            caption_height_fraction: 0.75,
        }
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Caption asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Root of `captions/`, `bmp/` and `videos/`
    pub resources_dir: PathBuf,

    /// Blur level selecting the bitmap variant
    pub blur_level: u32,

    /// Load pre-rendered caption bitmaps instead of text only
    pub use_bitmaps: bool,

    pub speaker_positions: SpeakerPositions,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("resources"),
            blur_level: 0,
            use_bitmaps: false,
            speaker_positions: SpeakerPositions::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Video section to play (1-4)
    pub video_section: u8,

    pub presentation: PresentationMethod,

    pub orientation: OrientationConfig,

    pub filter: FilterConfig,

    pub projection: ProjectionConfig,

    pub display: DisplayConfig,

    pub captions: CaptionConfig,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            video_section: 1,
            presentation: PresentationMethod::default(),
            orientation: OrientationConfig::default(),
            filter: FilterConfig::default(),
            projection: ProjectionConfig::default(),
            display: DisplayConfig::default(),
            captions: CaptionConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl SessionConfig {
    /// `resources/captions/merged_captions.{section}.json`
    pub fn script_path(&self) -> PathBuf {
        self.captions
            .resources_dir
            .join("captions")
            .join(format!("merged_captions.{}.json", self.video_section))
    }

    /// `resources/bmp/{section}`
    pub fn bitmap_dir(&self) -> PathBuf {
        self.captions
            .resources_dir
            .join("bmp")
            .join(self.video_section.to_string())
    }

    /// `resources/videos/main.{section}.mp4`
    pub fn video_path(&self) -> PathBuf {
        self.captions
            .resources_dir
            .join("videos")
            .join(format!("main.{}.mp4", self.video_section))
    }

    /// Check every setting the session depends on
    pub fn validate(&self) -> Result<()> {
        if self.video_section == 0 || self.video_section > VIDEO_SECTIONS {
            return Err(CaptionError::Config(format!(
                "Please pick a video section between 1-{}, got {}",
                VIDEO_SECTIONS, self.video_section
            )));
        }

        if !SUPPORTED_FOV_DEGREES.contains(&self.projection.fov_half_angle_deg) {
            return Err(CaptionError::Config(format!(
                "Field of view must be one of {:?} degrees, got {}",
                SUPPORTED_FOV_DEGREES, self.projection.fov_half_angle_deg
            )));
        }

        if !(self.projection.vertical_half_angle_deg > 0.0
            && self.projection.vertical_half_angle_deg < 90.0)
        {
            return Err(CaptionError::Config(format!(
                "Vertical half angle must be in (0, 90) degrees, got {}",
                self.projection.vertical_half_angle_deg
            )));
        }

        if self.projection.jiggle_threshold_px < 0.0 {
            return Err(CaptionError::Config(
                "Jiggle threshold must not be negative".to_string(),
            ));
        }

        let alpha = self.filter.exponential.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(CaptionError::Config(format!(
                "Smoothing factor must be in (0, 1], got {}",
                alpha
            )));
        }

        if self.filter.exponential.movement_threshold_px < 0.0 {
            return Err(CaptionError::Config(
                "Movement threshold must not be negative".to_string(),
            ));
        }

        if self.orientation.window_capacity == 0 {
            return Err(CaptionError::Config(
                "Orientation window capacity must be at least 1".to_string(),
            ));
        }

        if self.orientation.poll_interval_ms == 0 {
            return Err(CaptionError::Config(
                "Poll interval must be at least 1 ms".to_string(),
            ));
        }
        self.orientation.socket_addr()?;

        if self.display.width == 0 || self.display.height == 0 || self.display.fps == 0 {
            return Err(CaptionError::Config(format!(
                "Display must have a non-zero size and frame rate, got {}x{} @ {}",
                self.display.width, self.display.height, self.display.fps
            )));
        }

        if !(0.0..=1.0).contains(&self.display.caption_height_fraction) {
            return Err(CaptionError::Config(format!(
                "Caption height fraction must be in [0, 1], got {}",
                self.display.caption_height_fraction
            )));
        }

        for speaker in Speaker::ALL {
            let p = self.captions.speaker_positions.get(speaker);
            if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
                return Err(CaptionError::Config(format!(
                    "Position for {} must be fractions in [0, 1], got ({}, {})",
                    speaker, p.x, p.y
                )));
            }
        }

        if let Some(ref font) = self.display.font_path {
            if !font.exists() {
                return Err(CaptionError::Asset(format!(
                    "font file not found: {}",
                    font.display()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.presentation, PresentationMethod::Registered);
        assert_eq!(config.orientation.window_capacity, 500);
        assert_eq!(config.display.width, 3840);
    }

    #[test]
    fn test_resource_paths() {
        let config = SessionConfig {
            video_section: 3,
            ..Default::default()
        };
        assert_eq!(
            config.script_path(),
            PathBuf::from("resources/captions/merged_captions.3.json")
        );
        assert_eq!(config.bitmap_dir(), PathBuf::from("resources/bmp/3"));
        assert_eq!(config.video_path(), PathBuf::from("resources/videos/main.3.mp4"));
    }

    #[test]
    fn test_rejects_out_of_range_section() {
        for section in [0, 5] {
            let config = SessionConfig {
                video_section: section,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(CaptionError::Config(_))));
        }
    }

    #[test]
    fn test_rejects_unsupported_fov() {
        let mut config = SessionConfig::default();
        config.projection.fov_half_angle_deg = 12;
        assert!(config.validate().is_err());

        for fov in SUPPORTED_FOV_DEGREES {
            config.projection.fov_half_angle_deg = fov;
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_rejects_missing_font() {
        let mut config = SessionConfig::default();
        config.display.font_path = Some(PathBuf::from("/nonexistent/font.ttf"));
        assert!(matches!(config.validate(), Err(CaptionError::Asset(_))));
    }

    #[test]
    fn test_rejects_bad_alpha_and_host() {
        let mut config = SessionConfig::default();
        config.filter.exponential.alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.orientation.host = "not-an-ip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!("255, 128,0,64".parse::<Rgba>().unwrap(), Rgba::new(255, 128, 0, 64));
        assert!("255,255,255".parse::<Rgba>().is_err());
        assert!("256,0,0,0".parse::<Rgba>().is_err());
        assert!("red".parse::<Rgba>().is_err());
        assert_eq!(Rgba::new(1, 2, 3, 4).to_string(), "1,2,3,4");
    }

    #[test]
    fn test_presentation_method_parse() {
        assert_eq!(
            "1".parse::<PresentationMethod>().unwrap(),
            PresentationMethod::Registered
        );
        assert_eq!(
            "following-with-arrows".parse::<PresentationMethod>().unwrap(),
            PresentationMethod::FollowingWithArrows
        );
        assert!("9".parse::<PresentationMethod>().is_err());
        assert!(PresentationMethod::Following.follows_orientation());
        assert_eq!(PresentationMethod::FollowingWithArrows.id(), 3);
    }

    #[test]
    fn test_horizontal_bounds() {
        let bounds = ProjectionConfig::default().horizontal_bounds();
        assert!((bounds.left + 15f64.to_radians()).abs() < 1e-12);
        assert!((bounds.right - 15f64.to_radians()).abs() < 1e-12);
    }
}
