/// A mono buffer of f32 samples in `[-1, 1]` at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Builds a mono clip from interleaved frames by averaging channels.
    pub fn from_interleaved(data: &[f32], channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1) as usize;
        if channels == 1 {
            return Self::new(data.to_vec(), sample_rate);
        }

        let scale = 1.0 / channels as f32;
        let samples = data
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale)
            .collect();
        Self::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Root-mean-square level, accumulated in f64.
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }

    /// Scales the clip so its RMS equals `target`.
    ///
    /// Returns the RMS before scaling, or `None` when the clip is silent
    /// and was left untouched.
    pub fn normalize_rms(&mut self, target: f32) -> Option<f32> {
        let current = self.rms();
        if current <= SILENCE_RMS {
            return None;
        }
        let gain = target / current;
        for s in self.samples.iter_mut() {
            *s *= gain;
        }
        Some(current)
    }

    /// Returns the sub-clip `[start, end)`, clamped to the clip bounds.
    pub fn slice(&self, start: usize, end: usize) -> AudioClip {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        Self::new(self.samples[start..end].to_vec(), self.sample_rate)
    }
}

const SILENCE_RMS: f32 = 1e-9;

pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}
