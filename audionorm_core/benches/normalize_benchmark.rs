use std::f32::consts::TAU;
use std::fs::File;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use audionorm_core::{run, Config};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tempfile::TempDir;

struct SyntheticBatch {
    dir: TempDir,
}

impl SyntheticBatch {
    fn new(files: usize, sample_rate: u32, seconds: u32) -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        for n in 0..files {
            let path = dir.path().join(format!("tone-{n:02}.wav"));
            write_sine_wave(&path, sample_rate, seconds, 2, 220.0 + n as f32 * 55.0)?;
        }
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn write_sine_wave(
    path: &Path,
    sample_rate: u32,
    seconds: u32,
    channels: u16,
    frequency: f32,
) -> io::Result<()> {
    let total_frames = seconds as usize * sample_rate as usize;
    let amplitude = i16::MAX as f32 * 0.6;
    let mut samples = Vec::with_capacity(total_frames * channels as usize);

    for frame in 0..total_frames {
        let t = frame as f32 / sample_rate as f32;
        let sample = (amplitude * (frequency * TAU * t).sin()) as i16;
        for _ in 0..channels {
            samples.push(sample);
        }
    }

    write_wav_pcm_i16(path, sample_rate, channels, &samples)
}

fn write_wav_pcm_i16(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    samples: &[i16],
) -> io::Result<()> {
    let mut file = File::create(path)?;
    let bits_per_sample = 16u16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    let data_bytes = (samples.len() * 2) as u32;
    let chunk_size = 36u32 + data_bytes;

    file.write_all(b"RIFF")?;
    file.write_all(&chunk_size.to_le_bytes())?;
    file.write_all(b"WAVE")?;
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?; // PCM header length
    file.write_all(&1u16.to_le_bytes())?; // PCM format
    file.write_all(&channels.to_le_bytes())?;
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&block_align.to_le_bytes())?;
    file.write_all(&bits_per_sample.to_le_bytes())?;
    file.write_all(b"data")?;
    file.write_all(&data_bytes.to_le_bytes())?;

    for sample in samples {
        file.write_all(&sample.to_le_bytes())?;
    }

    Ok(())
}

struct Scenario {
    name: &'static str,
    workers: NonZeroUsize,
}

fn normalize_benchmarks(c: &mut Criterion) {
    let fixture = SyntheticBatch::new(8, 22_050, 2).expect("failed to synthesize audio fixtures");

    let scenarios = [
        Scenario {
            name: "batch_serial",
            workers: NonZeroUsize::new(1).expect("worker count must be non-zero"),
        },
        Scenario {
            name: "batch_4_workers",
            workers: NonZeroUsize::new(4).expect("worker count must be non-zero"),
        },
        Scenario {
            name: "batch_16_workers",
            workers: NonZeroUsize::new(16).expect("worker count must be non-zero"),
        },
    ];

    let mut group = c.benchmark_group("batch_normalize");

    for scenario in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(scenario.name),
            &scenario,
            |b, scenario| {
                b.iter_batched(
                    || {
                        let output = tempfile::tempdir().expect("failed to create output dir");
                        let config = Config::builder(fixture.path(), output.path().join("out"))
                            .target_peak(0.9)
                            .workers(scenario.workers)
                            .build()
                            .expect("failed to build config");
                        (config, output)
                    },
                    |(config, _output)| {
                        run(config).expect("batch run failed");
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, normalize_benchmarks);
criterion_main!(benches);
