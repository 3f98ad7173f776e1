//! Per-file normalization pipeline: load, measure, normalize, measure
//! again, save. Runs to completion on its worker thread with no knowledge
//! of the queue; every stage reports through the shared log.

use crate::buffer::{AudioBuffer, NormalizeOutcome, Statistics};
use crate::codec;
use crate::logger::SharedLogger;
use crate::queue::Task;
use crate::NormalizeError;

/// Run the full pipeline for one task.
///
/// Failures are task-local: the error is returned for the worker to count
/// and log, and the start/end banners bracket the attempt either way.
pub fn process_task(task: &Task, logger: &SharedLogger) -> Result<(), NormalizeError> {
    logger.banner(&format!("Processing started for {}", task.display_name));
    let result = run_stages(task, logger);
    if let Err(err) = &result {
        logger.write(&format!("Error: {err}"));
    }
    logger.banner(&format!("Processing ended for {}", task.display_name));
    result
}

fn run_stages(task: &Task, logger: &SharedLogger) -> Result<(), NormalizeError> {
    let decoded = codec::decode(&task.input_path)?;
    let mut buffer = decoded.buffer;

    log_load_summary(logger, &buffer, decoded.declared_frames);

    log_statistics(
        logger,
        &format!("Original stats for {}", task.display_name),
        &buffer,
    );

    match buffer.normalize_peak(task.target_peak) {
        NormalizeOutcome::Scaled {
            original_peak,
            factor,
        } => {
            logger.write(&format!("Original peak magnitude: {original_peak:.6}"));
            logger.write(&format!("Normalization factor: {factor:.6}"));
            logger.write(&format!("Peak normalized to {:.6}", task.target_peak));
        }
        NormalizeOutcome::Silence => {
            logger.write("Warning: audio contains only silence, skipping normalization");
        }
        NormalizeOutcome::Empty => {
            logger.write("Warning: no audio data decoded, nothing to normalize");
        }
    }

    log_statistics(
        logger,
        &format!("Normalized stats for {}", task.display_name),
        &buffer,
    );

    let frames_written = codec::encode(&task.output_path, &buffer)?;
    if frames_written != buffer.frames() {
        logger.write(&format!(
            "Warning: wrote {frames_written} frames, expected {}",
            buffer.frames()
        ));
    }
    logger.write(&format!("Saved to: {}", task.output_path.display()));

    Ok(())
}

fn log_load_summary(logger: &SharedLogger, buffer: &AudioBuffer, declared_frames: Option<u64>) {
    let bits = buffer
        .source_bits
        .map(|b| format!("{b}-bit"))
        .unwrap_or_else(|| "unknown depth".to_owned());
    logger.write(&format!(
        "Loaded {} frames, {} channel(s) at {} Hz ({bits})",
        buffer.frames(),
        buffer.channels,
        buffer.sample_rate
    ));

    if let Some(declared) = declared_frames {
        if declared != buffer.frames() {
            logger.write(&format!(
                "Warning: decoded {} frames, expected {declared}",
                buffer.frames()
            ));
        }
    }
}

fn log_statistics(logger: &SharedLogger, title: &str, buffer: &AudioBuffer) {
    if buffer.is_empty() {
        logger.write("No audio data to report statistics for");
        return;
    }

    let Statistics {
        min,
        max,
        peak_magnitude,
        rms,
        peak_to_rms,
    } = buffer.statistics();

    logger.write(&format!("--- {title} ---"));
    logger.write(&format!("Min value: {min:.6}"));
    logger.write(&format!("Max value: {max:.6}"));
    logger.write(&format!("Peak magnitude: {peak_magnitude:.6}"));
    logger.write(&format!("RMS: {rms:.6}"));
    logger.write(&format!("Peak-to-RMS ratio: {peak_to_rms:.6}"));
}
