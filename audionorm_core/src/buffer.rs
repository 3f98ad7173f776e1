//! Decoded audio data and the peak-normalization kernel.
//!
//! An [`AudioBuffer`] is owned by exactly one worker for the lifetime of one
//! task, so none of the operations here take any locks.

/// Interleaved floating-point audio samples plus the metadata needed to
/// re-encode them.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    /// Channel-interleaved samples in the range [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth of the source container, when the decoder reported one.
    pub source_bits: Option<u32>,
}

impl AudioBuffer {
    /// Number of frames (samples per channel) held by the buffer.
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() as u64 / u64::from(self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum absolute sample value, 0.0 for an empty buffer.
    pub fn peak_magnitude(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Compute [`Statistics`] over the buffer in a single linear pass.
    ///
    /// An empty buffer yields all-zero statistics; the caller is expected to
    /// report that condition rather than treat it as an error.
    pub fn statistics(&self) -> Statistics {
        if self.samples.is_empty() {
            return Statistics::default();
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum_squares = 0.0f64;
        for &sample in &self.samples {
            min = min.min(sample);
            max = max.max(sample);
            sum_squares += f64::from(sample) * f64::from(sample);
        }

        let peak_magnitude = min.abs().max(max.abs());
        let rms = (sum_squares / self.samples.len() as f64).sqrt() as f32;
        let peak_to_rms = if rms > 0.0 { peak_magnitude / rms } else { 0.0 };

        Statistics {
            min,
            max,
            peak_magnitude,
            rms,
            peak_to_rms,
        }
    }

    /// Scale every sample in place so the peak magnitude equals `target_peak`.
    ///
    /// Pure silence is left untouched; the returned outcome tells the caller
    /// which case applied so it can log accordingly.
    pub fn normalize_peak(&mut self, target_peak: f32) -> NormalizeOutcome {
        if self.samples.is_empty() {
            return NormalizeOutcome::Empty;
        }

        let original_peak = self.peak_magnitude();
        if original_peak == 0.0 {
            return NormalizeOutcome::Silence;
        }

        let factor = target_peak / original_peak;
        for sample in &mut self.samples {
            *sample *= factor;
        }

        NormalizeOutcome::Scaled {
            original_peak,
            factor,
        }
    }
}

/// Derived, non-persisted view over a buffer's sample distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Statistics {
    pub min: f32,
    pub max: f32,
    pub peak_magnitude: f32,
    pub rms: f32,
    /// Crest factor; 0.0 when the RMS is 0 to avoid dividing by zero.
    pub peak_to_rms: f32,
}

/// Result of a [`AudioBuffer::normalize_peak`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NormalizeOutcome {
    /// Samples were scaled by `factor` to move `original_peak` to the target.
    Scaled { original_peak: f32, factor: f32 },
    /// All samples are zero; the buffer was not modified.
    Silence,
    /// The buffer holds no samples at all.
    Empty,
}
