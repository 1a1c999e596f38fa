//! Configuration file support
//!
//! Loads session configuration from TOML files. Every section except
//! `[session]` is optional; missing values fall back to the defaults in
//! [`crate::config`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{
    CaptionConfig, DisplayConfig, FilterConfig, LogFormat, OrientationConfig, PresentationMethod,
    ProjectionConfig, Rgba, SessionConfig, SpeakerPositions,
};
use crate::error::Result;
use crate::orientation::{ExponentialParams, FilterPolicy, GateSample};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Session settings
    pub session: SessionSettings,
    /// Orientation link settings
    pub orientation: Option<OrientationSettings>,
    /// Filter settings
    pub filter: Option<FilterSettings>,
    /// Projection settings
    pub projection: Option<ProjectionSettings>,
    /// Display settings
    pub display: Option<DisplaySettings>,
    /// Caption asset settings
    pub captions: Option<CaptionSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Video section to play (1-4)
    pub video_section: u8,
    /// Presentation method
    pub presentation: Option<PresentationMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrientationSettings {
    /// Address to bind the datagram socket to
    pub host: Option<String>,
    /// Port to listen on
    pub port: Option<u16>,
    /// Samples retained in the rolling window
    pub window_capacity: Option<usize>,
    /// Receive timeout in milliseconds
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// moving-average or exponential
    pub policy: Option<FilterPolicy>,
    /// Exponential smoothing factor
    pub alpha: Option<f64>,
    /// Exponential movement gate in pixels
    pub movement_threshold_px: Option<f64>,
    /// Sample the exponential filter blends toward (latest, oldest)
    pub sample: Option<GateSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSettings {
    /// Horizontal half angle in degrees
    pub fov_half_angle_deg: Option<u32>,
    /// Azimuth at the screen center in radians
    pub center_azimuth: Option<f64>,
    /// Jiggle threshold in pixels
    pub jiggle_threshold_px: Option<f64>,
    /// Follow pitch vertically
    pub vertical_tracking: Option<bool>,
    /// Vertical half angle in degrees
    pub vertical_half_angle_deg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    /// Caption color as "r,g,b,a"
    pub foreground: Option<Rgba>,
    /// Caption background as "r,g,b,a"
    pub background: Option<Rgba>,
    /// Contrast mask opacity (0-255)
    pub mask_opacity: Option<u8>,
    pub font_path: Option<PathBuf>,
    /// Following caption height as a fraction of the surface
    pub caption_height_fraction: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSettings {
    pub resources_dir: Option<PathBuf>,
    pub blur_level: Option<u32>,
    pub use_bitmaps: Option<bool>,
    pub speaker_positions: Option<SpeakerPositions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let d = SessionConfig::default();
        Self {
            session: SessionSettings {
                video_section: d.video_section,
                presentation: Some(d.presentation),
            },
            orientation: Some(OrientationSettings {
                host: Some(d.orientation.host),
                port: Some(d.orientation.port),
                window_capacity: Some(d.orientation.window_capacity),
                poll_interval_ms: Some(d.orientation.poll_interval_ms),
            }),
            filter: Some(FilterSettings {
                policy: Some(d.filter.policy),
                alpha: Some(d.filter.exponential.alpha),
                movement_threshold_px: Some(d.filter.exponential.movement_threshold_px),
                sample: Some(d.filter.exponential.sample),
            }),
            projection: Some(ProjectionSettings {
                fov_half_angle_deg: Some(d.projection.fov_half_angle_deg),
                center_azimuth: Some(d.projection.center_azimuth),
                jiggle_threshold_px: Some(d.projection.jiggle_threshold_px),
                vertical_tracking: Some(d.projection.vertical_tracking),
                vertical_half_angle_deg: Some(d.projection.vertical_half_angle_deg),
            }),
            display: Some(DisplaySettings {
                width: Some(d.display.width),
                height: Some(d.display.height),
                fps: Some(d.display.fps),
                foreground: Some(d.display.foreground),
                background: Some(d.display.background),
                mask_opacity: Some(d.display.mask_opacity),
                font_path: None,
                caption_height_fraction: Some(d.display.caption_height_fraction),
            }),
            captions: Some(CaptionSettings {
                resources_dir: Some(d.captions.resources_dir),
                blur_level: Some(d.captions.blur_level),
                use_bitmaps: Some(d.captions.use_bitmaps),
                speaker_positions: Some(d.captions.speaker_positions),
            }),
            logging: Some(LoggingSettings {
                level: d.log_level,
                format: Some(d.log_format),
            }),
        }
    }

    /// Convert to SessionConfig
    pub fn into_session_config(self) -> SessionConfig {
        let d = SessionConfig::default();

        let orientation = match self.orientation {
            Some(o) => OrientationConfig {
                host: o.host.unwrap_or(d.orientation.host),
                port: o.port.unwrap_or(d.orientation.port),
                window_capacity: o.window_capacity.unwrap_or(d.orientation.window_capacity),
                poll_interval_ms: o.poll_interval_ms.unwrap_or(d.orientation.poll_interval_ms),
            },
            None => d.orientation,
        };

        let filter = match self.filter {
            Some(f) => FilterConfig {
                policy: f.policy.unwrap_or(d.filter.policy),
                exponential: ExponentialParams {
                    alpha: f.alpha.unwrap_or(d.filter.exponential.alpha),
                    movement_threshold_px: f
                        .movement_threshold_px
                        .unwrap_or(d.filter.exponential.movement_threshold_px),
                    sample: f.sample.unwrap_or(d.filter.exponential.sample),
                },
            },
            None => d.filter,
        };

        let projection = match self.projection {
            Some(p) => ProjectionConfig {
                fov_half_angle_deg: p
                    .fov_half_angle_deg
                    .unwrap_or(d.projection.fov_half_angle_deg),
                center_azimuth: p.center_azimuth.unwrap_or(d.projection.center_azimuth),
                jiggle_threshold_px: p
                    .jiggle_threshold_px
                    .unwrap_or(d.projection.jiggle_threshold_px),
                vertical_tracking: p.vertical_tracking.unwrap_or(d.projection.vertical_tracking),
                vertical_half_angle_deg: p
                    .vertical_half_angle_deg
                    .unwrap_or(d.projection.vertical_half_angle_deg),
            },
            None => d.projection,
        };

        let display = match self.display {
            Some(s) => DisplayConfig {
                width: s.width.unwrap_or(d.display.width),
                height: s.height.unwrap_or(d.display.height),
                fps: s.fps.unwrap_or(d.display.fps),
                foreground: s.foreground.unwrap_or(d.display.foreground),
                background: s.background.unwrap_or(d.display.background),
                mask_opacity: s.mask_opacity.unwrap_or(d.display.mask_opacity),
                font_path: s.font_path.or(d.display.font_path),
                caption_height_fraction: s
                    .caption_height_fraction
                    .unwrap_or(d.display.caption_height_fraction),
            },
            None => d.display,
        };

        let captions = match self.captions {
            Some(c) => CaptionConfig {
                resources_dir: c.resources_dir.unwrap_or(d.captions.resources_dir),
                blur_level: c.blur_level.unwrap_or(d.captions.blur_level),
                use_bitmaps: c.use_bitmaps.unwrap_or(d.captions.use_bitmaps),
                speaker_positions: c
                    .speaker_positions
                    .unwrap_or(d.captions.speaker_positions),
            },
            None => d.captions,
        };

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(d.log_format)),
            None => (d.log_level, d.log_format),
        };

        SessionConfig {
            video_section: self.session.video_section,
            presentation: self.session.presentation.unwrap_or(d.presentation),
            orientation,
            filter,
            projection,
            display,
            captions,
            log_level,
            log_format,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
