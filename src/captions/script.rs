//! Caption script loading
//!
//! A script is a JSON array of records:
//!
//! ```json
//! [{"text": "...", "delay": 1200, "speaker_id": "juror-a", "message_id": 0, "chunk_id": 0}]
//! ```
//!
//! `delay` is cumulative milliseconds since playback start.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CaptionError, Result};

/// On-screen speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Speaker {
    JurorA,
    JurorB,
    JurorC,
    JuryForeman,
}

impl Speaker {
    pub const ALL: [Speaker; 4] = [
        Speaker::JurorA,
        Speaker::JurorB,
        Speaker::JurorC,
        Speaker::JuryForeman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::JurorA => "juror-a",
            Speaker::JurorB => "juror-b",
            Speaker::JurorC => "juror-c",
            Speaker::JuryForeman => "jury-foreman",
        }
    }
}

impl std::str::FromStr for Speaker {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        Speaker::ALL
            .into_iter()
            .find(|speaker| speaker.as_str() == s)
            .ok_or_else(|| CaptionError::UnknownSpeaker(s.to_string()))
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    text: String,
    delay: f64,
    speaker_id: String,
    message_id: i64,
    chunk_id: i64,
}

/// One caption in playback order
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRecord {
    pub text: String,
    /// Cumulative delay since playback start, in milliseconds
    pub delay_ms: f64,
    pub speaker: Speaker,
    pub message_id: i64,
    pub chunk_id: i64,
}

/// Ordered caption records for one video section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionScript {
    pub records: Vec<CaptionRecord>,
}

impl CaptionScript {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<RawRecord> = serde_json::from_str(json)?;
        let records = raw
            .into_iter()
            .map(|r| {
                if !r.delay.is_finite() {
                    return Err(CaptionError::Script(format!(
                        "message {} chunk {} has a non-finite delay",
                        r.message_id, r.chunk_id
                    )));
                }
                Ok(CaptionRecord {
                    speaker: r.speaker_id.parse()?,
                    text: r.text,
                    delay_ms: r.delay,
                    message_id: r.message_id,
                    chunk_id: r.chunk_id,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CaptionError::Asset(format!("caption script {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Speaker of every record, in order
    pub fn speakers(&self) -> Vec<Speaker> {
        self.records.iter().map(|r| r.speaker).collect()
    }

    /// Sleep before each advance: `delay[0]`, then `delay[i] - delay[i-1]`.
    ///
    /// A record whose cumulative delay goes backwards advances immediately.
    pub fn inter_caption_delays(&self) -> Vec<Duration> {
        let mut previous = 0.0;
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let delta = record.delay_ms - previous;
                previous = record.delay_ms;
                if delta < 0.0 {
                    tracing::warn!(
                        "Caption {} delay {}ms is earlier than the previous caption; advancing immediately",
                        i,
                        record.delay_ms
                    );
                    Duration::ZERO
                } else {
                    Duration::from_secs_f64(delta / 1000.0)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"[
        {"text": "Guilty.", "delay": 1000, "speaker_id": "juror-a", "message_id": 0, "chunk_id": 0},
        {"text": "Not so fast.", "delay": 2500, "speaker_id": "jury-foreman", "message_id": 1, "chunk_id": 0},
        {"text": "Why not?", "delay": 2750.5, "speaker_id": "juror-c", "message_id": 2, "chunk_id": 1}
    ]"#;

    #[test]
    fn test_parse_script() {
        let script = CaptionScript::from_json_str(SCRIPT).unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script.records[1].text, "Not so fast.");
        assert_eq!(script.records[1].speaker, Speaker::JuryForeman);
        assert_eq!(script.records[2].chunk_id, 1);
        assert_eq!(
            script.speakers(),
            vec![Speaker::JurorA, Speaker::JuryForeman, Speaker::JurorC]
        );
    }

    #[test]
    fn test_inter_caption_delays() {
        let script = CaptionScript::from_json_str(SCRIPT).unwrap();
        assert_eq!(
            script.inter_caption_delays(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(1500),
                Duration::from_secs_f64(0.2505),
            ]
        );
    }

    #[test]
    fn test_backwards_delay_clamps_to_zero() {
        let script = CaptionScript::from_json_str(
            r#"[
                {"text": "a", "delay": 500, "speaker_id": "juror-b", "message_id": 0, "chunk_id": 0},
                {"text": "b", "delay": 200, "speaker_id": "juror-b", "message_id": 1, "chunk_id": 0},
                {"text": "c", "delay": 300, "speaker_id": "juror-b", "message_id": 2, "chunk_id": 0}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            script.inter_caption_delays(),
            vec![
                Duration::from_millis(500),
                Duration::ZERO,
                Duration::from_millis(100)
            ]
        );
    }

    #[test]
    fn test_unknown_speaker_is_rejected() {
        let err = CaptionScript::from_json_str(
            r#"[{"text": "x", "delay": 0, "speaker_id": "bailiff", "message_id": 0, "chunk_id": 0}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CaptionError::UnknownSpeaker(ref s) if s == "bailiff"));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = CaptionScript::from_json_str(r#"[{"text": "x", "delay": 0}]"#).unwrap_err();
        assert!(matches!(err, CaptionError::Json(_)));
    }

    #[test]
    fn test_speaker_round_trip_names() {
        for speaker in Speaker::ALL {
            assert_eq!(speaker.as_str().parse::<Speaker>().unwrap(), speaker);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = CaptionScript::from_file("/nonexistent/merged_captions.1.json").unwrap_err();
        assert!(matches!(err, CaptionError::Asset(_)));
    }
}
