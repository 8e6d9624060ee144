//! WAV decoding and PCM16 encoding via `hound`.

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{AudioClip, AudioError};

/// Reads a WAV file of any channel count and integer or float sample
/// format, downmixing to mono.
pub fn read_wav(path: impl AsRef<Path>) -> Result<AudioClip, AudioError> {
    let reader = WavReader::open(path.as_ref())?;
    decode(reader)
}

/// Decodes a WAV stream, downmixing to mono.
pub fn read_wav_from<R: Read>(reader: R) -> Result<AudioClip, AudioError> {
    decode(WavReader::new(reader)?)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<AudioClip, AudioError> {
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::Unsupported(format!(
                    "{} bits per sample",
                    spec.bits_per_sample
                )));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };
    Ok(AudioClip::from_interleaved(
        &interleaved,
        spec.channels,
        spec.sample_rate,
    ))
}

fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn to_i16(s: f32) -> i16 {
    (s * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Writes the clip as mono PCM16, creating parent directories.
pub fn write_wav(path: impl AsRef<Path>, clip: &AudioClip) -> Result<(), AudioError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = WavWriter::create(path, pcm16_spec(clip.sample_rate()))?;
    for &s in clip.samples() {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encodes the clip as an in-memory mono PCM16 WAV file.
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>, AudioError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, pcm16_spec(clip.sample_rate()))?;
        for &s in clip.samples() {
            writer.write_sample(to_i16(s))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, n: usize, rate: u32) -> AudioClip {
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect();
        AudioClip::new(samples, rate)
    }

    #[test]
    fn write_then_read_preserves_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.wav");
        let clip = sine(440.0, 1600, 16000);

        write_wav(&path, &clip).unwrap();
        let back = read_wav(&path).unwrap();

        assert_eq!(back.sample_rate(), 16000);
        assert_eq!(back.len(), clip.len());
        for (a, b) in clip.samples().iter().zip(back.samples()) {
            assert!((a - b).abs() < 1e-3, "pcm16 quantization too large: {a} vs {b}");
        }
    }

    #[test]
    fn encode_matches_file_layout() {
        let clip = sine(220.0, 800, 8000);
        let bytes = encode_wav(&clip).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        let back = read_wav_from(Cursor::new(bytes)).unwrap();
        assert_eq!(back.len(), 800);
        assert_eq!(back.sample_rate(), 8000);
    }

    #[test]
    fn stereo_file_is_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut w = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            w.write_sample(16384i16).unwrap();
            w.write_sample(0i16).unwrap();
        }
        w.finalize().unwrap();

        let clip = read_wav(&path).unwrap();
        assert_eq!(clip.len(), 100);
        assert!((clip.samples()[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = read_wav_from(Cursor::new(b"not a wav file".to_vec())).unwrap_err();
        assert!(matches!(err, AudioError::Wav(_)));
    }
}
