//! Offline sample rate conversion using rubato.

use rubato::{FftFixedInOut, Resampler};

use crate::{AudioClip, AudioError};

/// Frames per rubato processing block.
const CHUNK_SIZE: usize = 1024;

/// Resamples a whole clip to `target_rate`.
///
/// The FFT resampler's output delay is removed and the result is cut to
/// `len * target / source` samples so durations are preserved.
pub fn resample(clip: &AudioClip, target_rate: u32) -> Result<AudioClip, AudioError> {
    let source_rate = clip.sample_rate();
    if source_rate == 0 || target_rate == 0 {
        return Err(AudioError::Unsupported(format!(
            "cannot resample {source_rate}Hz -> {target_rate}Hz"
        )));
    }
    if source_rate == target_rate {
        return Ok(clip.clone());
    }

    let input = clip.samples();
    if input.is_empty() {
        return Ok(AudioClip::new(Vec::new(), target_rate));
    }

    let mut resampler = FftFixedInOut::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        1,
    )?;
    let delay = resampler.output_delay();
    let expected = (input.len() as u64 * target_rate as u64 / source_rate as u64) as usize;

    let mut out: Vec<f32> = Vec::with_capacity(expected + delay);
    let mut pos = 0;
    loop {
        let need = resampler.input_frames_next();
        if input.len() - pos < need {
            break;
        }
        let frames: &[&[f32]] = &[&input[pos..pos + need]];
        let block = resampler.process(frames, None)?;
        out.extend_from_slice(&block[0]);
        pos += need;
    }
    if pos < input.len() {
        let tail: &[&[f32]] = &[&input[pos..]];
        let block = resampler.process_partial(Some(tail), None)?;
        out.extend_from_slice(&block[0]);
    }
    // Flush the filter tail until the delayed output covers the input.
    while out.len() < expected + delay {
        let block = resampler.process_partial(None::<&[&[f32]]>, None)?;
        if block[0].is_empty() {
            break;
        }
        out.extend_from_slice(&block[0]);
    }

    let samples: Vec<f32> = out.into_iter().skip(delay).take(expected).collect();
    Ok(AudioClip::new(samples, target_rate))
}
