//! Container decode/encode seam.
//!
//! Decoding goes through Symphonia so the input side accepts any container
//! the enabled features cover; the output side is fixed to 32-bit float WAV
//! written with hound, regardless of the source bit depth.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::buffer::AudioBuffer;
use crate::NormalizeError;

/// A fully decoded file along with the frame count the container declared,
/// which may differ from what was actually decodable.
#[derive(Debug)]
pub struct DecodedAudio {
    pub buffer: AudioBuffer,
    pub declared_frames: Option<u64>,
}

/// Decode the entire file at `path` into interleaved f32 samples.
pub fn decode(path: &Path) -> Result<DecodedAudio, NormalizeError> {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or(NormalizeError::MissingDefaultTrack)?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(NormalizeError::UnsupportedCodec);
    }

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(NormalizeError::MissingSampleRate)?;
    let declared_channels = track.codec_params.channels.map(|c| c.count());
    let declared_frames = track.codec_params.n_frames;
    let source_bits = track.codec_params.bits_per_sample;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    let mut decoded_channels: Option<usize> = None;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                decoded_channels.get_or_insert(spec.channels.count());

                let needed = decoded.frames() * spec.channels.count();
                let reallocate = sample_buf
                    .as_ref()
                    .map_or(true, |buf| buf.capacity() < needed);
                if reallocate {
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            // Skip over malformed packets; the short read surfaces as a
            // frame-count mismatch that the pipeline logs as a warning.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    let channels = declared_channels
        .or(decoded_channels)
        .ok_or(NormalizeError::MissingChannelLayout)?;

    Ok(DecodedAudio {
        buffer: AudioBuffer {
            samples,
            channels: channels as u16,
            sample_rate,
            source_bits,
        },
        declared_frames,
    })
}

/// Encode `buffer` as 32-bit float WAV at `path`, returning the number of
/// frames written.
pub fn encode(path: &Path, buffer: &AudioBuffer) -> Result<u64, NormalizeError> {
    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        writer.write_sample(sample)?;
    }
    let frames_written = u64::from(writer.duration());
    writer.finalize()?;

    Ok(frames_written)
}
