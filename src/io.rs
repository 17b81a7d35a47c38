//! Audio loading and writing at the boundary of the matching engine.
//!
//! Both the corpus (the soundtrack of the sample video) and the target track
//! are decoded to mono and, by default, resampled to 22 050 Hz so their
//! windows are directly comparable.

use crate::signal::AudioSignal;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Sample rate every input is brought to unless told otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("hound error: {0}")]
    Hound(#[from] hound::Error),
    #[error("symphonia error: {0}")]
    Symphonia(SymphoniaError),
    #[error("no audio track found")]
    NoAudioTrack,
    #[error("unsupported number of channels")]
    UnsupportedChannels,
    #[error("resampling error: {0}")]
    Resample(String),
}

impl From<SymphoniaError> for AudioError {
    fn from(err: SymphoniaError) -> Self {
        Self::Symphonia(err)
    }
}

/// How decoded audio is normalized on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Resample to this rate; `None` keeps the file's rate.
    pub sample_rate: Option<u32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
        }
    }
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn finish(samples: Vec<f32>, sample_rate: u32, options: &LoadOptions) -> crate::Result<AudioSignal> {
    match options.sample_rate {
        Some(target) if target != sample_rate && sample_rate > 0 => {
            let resampled = resample(&samples, sample_rate, target)?;
            AudioSignal::new(resampled, target)
        }
        _ => AudioSignal::new(samples, sample_rate),
    }
}

/// Load a WAV file as a mono signal.
///
/// # Errors
/// Returns `crate::Error::Audio` if the file cannot be read or is invalid
pub fn load_wav<P: AsRef<Path>>(path: P, options: &LoadOptions) -> crate::Result<AudioSignal> {
    let mut reader = WavReader::open(path).map_err(AudioError::Hound)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(AudioError::Hound)?,
        (SampleFormat::Int, bits) if bits <= 16 => {
            let scale = (1i32 << (bits - 1)) as f32;
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(AudioError::Hound)?
        }
        (SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(AudioError::Hound)?
        }
    };

    let mono = downmix(&samples, spec.channels as usize);
    finish(mono, spec.sample_rate, options)
}

/// Decode the first audio track of any supported container as a mono signal.
///
/// Handles WAV, FLAC, MP3, OGG as well as the soundtrack of MP4/MKV video
/// files.
///
/// # Example
/// ```no_run
/// use audiocollage::io::{self, LoadOptions};
///
/// let corpus = io::load_signal("sample.mp4", &LoadOptions::default()).unwrap();
/// assert_eq!(corpus.sample_rate(), 22050);
/// ```
pub fn load_signal<P: AsRef<Path>>(path: P, options: &LoadOptions) -> crate::Result<AudioSignal> {
    let path_ref = path.as_ref();
    let mut hint = Hint::new();
    if let Some(ext) = path_ref.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let file = std::fs::File::open(path_ref)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(AudioError::from)?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.sample_rate.is_some())
        .ok_or(AudioError::NoAudioTrack)?
        .clone();

    let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);
    if channels == 0 {
        return Err(AudioError::UnsupportedChannels.into());
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(AudioError::from)?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(AudioError::from(e).into()),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(audio) => audio,
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(AudioError::from(e).into()),
        };

        let mut sb = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sb.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sb.samples());
    }

    let mono = downmix(&samples, channels);
    finish(mono, sample_rate, options)
}

/// Resample a mono signal with band-limited sinc interpolation.
pub fn resample(samples: &[f32], src_sr: u32, dst_sr: u32) -> Result<Vec<f32>, AudioError> {
    if src_sr == dst_sr || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let gcd = gcd_u32(src_sr, dst_sr);
    let resample_ratio = (dst_sr / gcd) as f64 / (src_sr / gcd) as f64;

    let chunk_size = 1024usize;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let mut output = Vec::new();
    for chunk in samples.chunks(chunk_size) {
        let mut buf = vec![0.0f32; chunk_size];
        buf[..chunk.len()].copy_from_slice(chunk);
        let chunk_out = resampler
            .process(&[buf], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if let Some(channel) = chunk_out.first() {
            output.extend_from_slice(channel);
        }
    }

    let expected = (samples.len() as f64 * resample_ratio).round() as usize;
    output.truncate(expected);
    Ok(output)
}

fn gcd_u32(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Write a signal as 16-bit mono PCM WAV, clipping to [-1.0, 1.0].
pub fn save_wav<P: AsRef<Path>>(path: P, signal: &AudioSignal) -> crate::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: signal.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(AudioError::Hound)?;
    for &sample in signal.samples() {
        let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(s).map_err(AudioError::Hound)?;
    }
    writer.finalize().map_err(AudioError::Hound)?;
    Ok(())
}

/// Generate a pure tone.
pub fn tone(frequency: f32, sr: u32, duration: f32) -> Vec<f32> {
    let n_samples = (duration * sr as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sr as f32;
    (0..n_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect()
}
