//! Command-line arguments.
//!
//! Every session setting is optional on the command line; anything given
//! here overrides the configuration file.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{PresentationMethod, Rgba, SessionConfig};
use crate::orientation::FilterPolicy;

/// Orientation-following caption session.
#[derive(Parser, Debug, Clone)]
#[command(name = "orientation-captions")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (TOML).
    #[arg(short = 'c', long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Video section to play (1-4).
    #[arg(short = 'v', long)]
    pub video_section: Option<u8>,

    /// Presentation method: 1 registered, 2 following, 3 following with arrows.
    #[arg(short = 'm', long)]
    pub presentation_method: Option<PresentationMethod>,

    /// Horizontal field-of-view half angle in degrees (5, 10, 15, 20).
    #[arg(short = 'a', long)]
    pub angle_fov: Option<u32>,

    /// Caption color as "r,g,b,a".
    #[arg(short = 'f', long)]
    pub foreground_color: Option<Rgba>,

    /// Caption background color as "r,g,b,a".
    #[arg(short = 'b', long)]
    pub background_color: Option<Rgba>,

    /// Font used to rasterize captions.
    #[arg(short = 'p', long)]
    pub path_to_font: Option<PathBuf>,

    /// Caption bitmap blur level.
    #[arg(short = 'l', long)]
    pub blur_level: Option<u32>,

    /// Contrast mask opacity (0-255).
    #[arg(short = 'o', long)]
    pub opacity: Option<u8>,

    /// Orientation datagram port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Orientation filter (moving-average, exponential).
    #[arg(long)]
    pub filter: Option<FilterPolicy>,

    /// Load pre-rendered caption bitmaps.
    #[arg(long)]
    pub bitmaps: bool,

    /// Logging level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write a default configuration file to the given path and exit.
    #[arg(long, value_name = "PATH")]
    pub write_default_config: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(section) = self.video_section {
            config.video_section = section;
        }
        if let Some(method) = self.presentation_method {
            config.presentation = method;
        }
        if let Some(fov) = self.angle_fov {
            config.projection.fov_half_angle_deg = fov;
        }
        if let Some(fg) = self.foreground_color {
            config.display.foreground = fg;
        }
        if let Some(bg) = self.background_color {
            config.display.background = bg;
        }
        if let Some(ref font) = self.path_to_font {
            config.display.font_path = Some(font.clone());
        }
        if let Some(blur) = self.blur_level {
            config.captions.blur_level = blur;
        }
        if let Some(opacity) = self.opacity {
            config.display.mask_opacity = opacity;
        }
        if let Some(port) = self.port {
            config.orientation.port = port;
        }
        if let Some(policy) = self.filter {
            config.filter.policy = policy;
        }
        if self.bitmaps {
            config.captions.use_bitmaps = true;
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::parse_from(["orientation-captions"]);
        assert_eq!(args.config, PathBuf::from("config.toml"));

        let mut config = SessionConfig::default();
        args.apply(&mut config);
        assert_eq!(config.video_section, 1);
        assert_eq!(config.presentation, PresentationMethod::Registered);
        assert_eq!(config.display.foreground, Rgba::WHITE);
    }

    #[test]
    fn test_short_flags_override() {
        let args = Args::parse_from([
            "orientation-captions",
            "-v",
            "3",
            "-m",
            "2",
            "-a",
            "20",
            "-f",
            "255,255,0,255",
            "-b",
            "0,0,0,128",
            "-l",
            "2",
            "-o",
            "90",
        ]);

        let mut config = SessionConfig::default();
        args.apply(&mut config);
        assert_eq!(config.video_section, 3);
        assert_eq!(config.presentation, PresentationMethod::Following);
        assert_eq!(config.projection.fov_half_angle_deg, 20);
        assert_eq!(config.display.foreground, Rgba::new(255, 255, 0, 255));
        assert_eq!(config.display.background, Rgba::new(0, 0, 0, 128));
        assert_eq!(config.captions.blur_level, 2);
        assert_eq!(config.display.mask_opacity, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_long_flags() {
        let args = Args::parse_from([
            "orientation-captions",
            "--port",
            "9000",
            "--filter",
            "exponential",
            "--presentation-method",
            "following-with-arrows",
            "--bitmaps",
        ]);

        let mut config = SessionConfig::default();
        args.apply(&mut config);
        assert_eq!(config.orientation.port, 9000);
        assert_eq!(config.filter.policy, FilterPolicy::Exponential);
        assert_eq!(config.presentation, PresentationMethod::FollowingWithArrows);
        assert!(config.captions.use_bitmaps);
    }

    #[test]
    fn test_rejects_malformed_color() {
        let result = Args::try_parse_from(["orientation-captions", "-f", "255,255"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_method() {
        let result = Args::try_parse_from(["orientation-captions", "-m", "7"]);
        assert!(result.is_err());
    }
}
