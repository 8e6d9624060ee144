//! Voice activity detection used for silence trimming.
//!
//! Two detectors are provided and chosen through [`VadMode`]:
//!
//! - [`RealVoiceActivityDetector`]: frame energy compared against the
//!   loudest frame of the clip. Frames more than `top_db` below the peak
//!   are treated as silence.
//! - [`AlwaysActiveDetector`]: reports every frame as speech, which turns
//!   trimming into a no-op.

use serde::{Deserialize, Serialize};

use crate::clip::rms;
use crate::AudioClip;

/// Classifies fixed-size frames of a clip as speech or silence.
pub trait VoiceActivityDetector: Send + Sync {
    /// Returns one flag per `frame_len`-sample frame (the last frame may
    /// be shorter).
    fn detect(&self, clip: &AudioClip, frame_len: usize) -> Vec<bool>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Energy-based detector relative to the clip's loudest frame.
#[derive(Debug, Clone, Copy)]
pub struct RealVoiceActivityDetector {
    top_db: f32,
}

impl RealVoiceActivityDetector {
    pub fn new(top_db: f32) -> Self {
        let top_db = if top_db.is_finite() && top_db > 0.0 {
            top_db
        } else {
            DEFAULT_TOP_DB
        };
        Self { top_db }
    }

    pub fn top_db(&self) -> f32 {
        self.top_db
    }
}

impl Default for RealVoiceActivityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_DB)
    }
}

/// Default trim threshold below the peak frame, in dB.
pub const DEFAULT_TOP_DB: f32 = 25.0;

impl VoiceActivityDetector for RealVoiceActivityDetector {
    fn detect(&self, clip: &AudioClip, frame_len: usize) -> Vec<bool> {
        let frame_len = frame_len.max(1);
        let levels: Vec<f32> = clip.samples().chunks(frame_len).map(rms).collect();
        let peak = levels.iter().cloned().fold(0.0f32, f32::max);
        if peak <= 0.0 {
            return vec![false; levels.len()];
        }
        let floor = peak * 10f32.powf(-self.top_db / 20.0);
        levels.iter().map(|&l| l > 0.0 && l >= floor).collect()
    }

    fn name(&self) -> &'static str {
        "energy"
    }
}

/// Detector that treats every frame as speech.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysActiveDetector;

impl VoiceActivityDetector for AlwaysActiveDetector {
    fn detect(&self, clip: &AudioClip, frame_len: usize) -> Vec<bool> {
        let frame_len = frame_len.max(1);
        vec![true; clip.len().div_ceil(frame_len)]
    }

    fn name(&self) -> &'static str {
        "always_active"
    }
}

/// Detector selection, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VadMode {
    #[default]
    Energy,
    AlwaysActive,
}

impl VadMode {
    pub fn build(self, top_db: f32) -> Box<dyn VoiceActivityDetector> {
        match self {
            VadMode::Energy => Box::new(RealVoiceActivityDetector::new(top_db)),
            VadMode::AlwaysActive => Box::new(AlwaysActiveDetector),
        }
    }
}

impl std::str::FromStr for VadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "energy" => Ok(VadMode::Energy),
            "always_active" | "off" => Ok(VadMode::AlwaysActive),
            other => Err(format!("unknown vad mode: {other}")),
        }
    }
}

/// Cuts leading and trailing inactive frames.
///
/// A clip with no active frame at all is returned unchanged.
pub fn trim_silence(
    clip: &AudioClip,
    detector: &dyn VoiceActivityDetector,
    frame_len: usize,
) -> AudioClip {
    let frame_len = frame_len.max(1);
    let flags = detector.detect(clip, frame_len);
    let first = flags.iter().position(|&a| a);
    let last = flags.iter().rposition(|&a| a);
    match (first, last) {
        (Some(first), Some(last)) => clip.slice(first * frame_len, (last + 1) * frame_len),
        _ => clip.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_tone() -> AudioClip {
        let mut samples = vec![0.0f32; 300];
        samples.extend((0..400).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }));
        samples.extend(vec![0.0f32; 300]);
        AudioClip::new(samples, 1000)
    }

    #[test]
    fn energy_detector_marks_tone() {
        let clip = padded_tone();
        let flags = RealVoiceActivityDetector::default().detect(&clip, 100);
        assert_eq!(flags.len(), 10);
        assert_eq!(
            flags,
            vec![false, false, false, true, true, true, true, false, false, false]
        );
    }

    #[test]
    fn trim_removes_padding() {
        let clip = padded_tone();
        let trimmed = trim_silence(&clip, &RealVoiceActivityDetector::default(), 100);
        assert_eq!(trimmed.len(), 400);
        assert_eq!(trimmed.samples()[0], 0.5);
    }

    #[test]
    fn quiet_noise_below_threshold_is_silence() {
        let mut samples = vec![0.001f32; 200];
        samples.extend(vec![0.5f32; 200]);
        let clip = AudioClip::new(samples, 1000);
        let trimmed = trim_silence(&clip, &RealVoiceActivityDetector::new(25.0), 100);
        assert_eq!(trimmed.len(), 200);
    }

    #[test]
    fn always_active_keeps_everything() {
        let clip = padded_tone();
        let trimmed = trim_silence(&clip, &AlwaysActiveDetector, 100);
        assert_eq!(trimmed, clip);
        assert_eq!(AlwaysActiveDetector.detect(&clip, 300).len(), 4);
    }

    #[test]
    fn silent_clip_is_untouched() {
        let clip = AudioClip::new(vec![0.0; 500], 1000);
        assert_eq!(trim_silence(&clip, &RealVoiceActivityDetector::default(), 100), clip);
    }

    #[test]
    fn mode_builds_detector() {
        assert_eq!(VadMode::Energy.build(25.0).name(), "energy");
        assert_eq!(VadMode::AlwaysActive.build(25.0).name(), "always_active");
        assert_eq!("off".parse::<VadMode>().unwrap(), VadMode::AlwaysActive);
        assert!("webrtc".parse::<VadMode>().is_err());
    }
}
