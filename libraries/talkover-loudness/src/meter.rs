//! Gated loudness measurement
//!
//! Implements the ITU-R BS.1770-4 gating algorithm: the signal is
//! K-weighted, cut into 400 ms blocks with 75% overlap, and the integrated
//! loudness is averaged over the blocks that survive an absolute −70 LKFS
//! gate and a relative gate 10 LU below the absolutely-gated level. Signals
//! shorter than one block cannot be gated and report their single-block
//! momentary loudness instead.

use crate::error::{LoudnessError, Result};
use crate::filter::KWeightingFilter;
use talkover_core::AudioBuffer;

/// Absolute gating threshold in LKFS
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Gating block duration in seconds
pub const GATING_BLOCK_SECS: f64 = 0.4;

/// Overlap between consecutive gating blocks, as a fraction of the block
pub const GATING_BLOCK_OVERLAP: f64 = 0.75;

/// Per-channel weighting for the L, R, C, Ls, Rs layout; the surround
/// channels contribute +1.5 dB
pub const CHANNEL_GAINS: [f64; 5] = [1.0, 1.0, 1.0, 1.41, 1.41];

/// Offset that calibrates the K-weighted mean square to LKFS
const LOUDNESS_OFFSET_DB: f64 = -0.691;

/// Gap between the absolutely-gated loudness and the relative threshold
const RELATIVE_GATE_LU: f64 = 10.0;

/// Per-block mean-square energies and loudness values for one signal.
///
/// `energy[i][j]` is the K-weighted mean square of channel `i` in block `j`
/// (eq. 1 of BS.1770); `loudness[j]` the corresponding block loudness
/// (eq. 4). A signal at most one block long yields a single block.
struct GatingBlocks {
    loudness: Vec<f64>,
    energy: Vec<Vec<f64>>,
}

/// BS.1770 loudness meter for one working sample rate.
///
/// Construction derives the K-weighting cascade once; measurement never
/// mutates the meter or the input buffer, so the same meter serves any
/// number of measurements.
///
/// # Example
///
/// ```ignore
/// let meter = LoudnessMeter::new(48000);
/// let lufs = meter.measure(&buffer)?;
/// ```
#[derive(Debug, Clone)]
pub struct LoudnessMeter {
    sample_rate: u32,
    filter: KWeightingFilter,
}

impl LoudnessMeter {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            filter: KWeightingFilter::new(sample_rate),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Measure loudness with the standard −70 LKFS floor.
    pub fn measure(&self, buffer: &AudioBuffer) -> Result<f64> {
        self.measure_with_floor(buffer, ABSOLUTE_GATE_LUFS)
    }

    /// Measure loudness, clamping the result upward to `floor`.
    ///
    /// Signals longer than one gating block are measured with the full
    /// gating algorithm; shorter signals report momentary loudness. Silence
    /// (and any signal whose gated energy vanishes) measures as exactly
    /// `floor`.
    pub fn measure_with_floor(&self, buffer: &AudioBuffer, floor: f64) -> Result<f64> {
        self.validate(buffer)?;

        let block_frames = GATING_BLOCK_SECS * f64::from(self.sample_rate);
        let lufs = if buffer.num_frames() as f64 > block_frames {
            self.integrated(buffer)
        } else {
            // Too short to gate: a single momentary value
            self.gating_blocks(buffer).loudness[0]
        };
        Ok(lufs.max(floor))
    }

    fn validate(&self, buffer: &AudioBuffer) -> Result<()> {
        if buffer.num_channels() > CHANNEL_GAINS.len() {
            return Err(LoudnessError::TooManyChannels(buffer.num_channels()));
        }
        if buffer.sample_rate() != self.sample_rate {
            return Err(LoudnessError::SampleRateMismatch {
                meter: self.sample_rate,
                buffer: buffer.sample_rate(),
            });
        }
        Ok(())
    }

    /// Integrated loudness over both gates (eq. 5-7 of BS.1770-4).
    fn integrated(&self, buffer: &AudioBuffer) -> f64 {
        let blocks = self.gating_blocks(buffer);
        let num_channels = buffer.num_channels();

        // Absolute gate: blocks at or above -70 LKFS
        let above_absolute: Vec<usize> = (0..blocks.loudness.len())
            .filter(|&j| blocks.loudness[j] >= ABSOLUTE_GATE_LUFS)
            .collect();
        let gated_mean = |kept: &[usize], i: usize| -> f64 {
            if kept.is_empty() {
                // An empty gate has no mean; the NaN rides through the
                // relative threshold and empties the second gate as well
                f64::NAN
            } else {
                kept.iter().map(|&j| blocks.energy[i][j]).sum::<f64>() / kept.len() as f64
            }
        };
        let mean_abs: Vec<f64> = (0..num_channels)
            .map(|i| gated_mean(&above_absolute, i))
            .collect();

        // Relative threshold, 10 LU below the absolutely-gated loudness
        let gamma_r = block_loudness(weighted_sum(&mean_abs)) - RELATIVE_GATE_LU;

        // Second gate: blocks above both thresholds
        let above_both: Vec<usize> = (0..blocks.loudness.len())
            .filter(|&j| blocks.loudness[j] > gamma_r && blocks.loudness[j] > ABSOLUTE_GATE_LUFS)
            .collect();
        let mean_rel: Vec<f64> = (0..num_channels)
            .map(|i| {
                let mean = gated_mean(&above_both, i);
                if mean.is_nan() {
                    0.0
                } else {
                    mean
                }
            })
            .collect();

        // A fully-gated signal sums to zero here and comes out as negative
        // infinity, which the caller's floor clamps
        block_loudness(weighted_sum(&mean_rel))
    }

    /// K-weight the signal and accumulate per-block mean squares.
    fn gating_blocks(&self, buffer: &AudioBuffer) -> GatingBlocks {
        let num_channels = buffer.num_channels();
        let frames = buffer.num_frames();
        let rate = f64::from(self.sample_rate);
        let block_frames = GATING_BLOCK_SECS * rate;

        let weighted: Vec<Vec<f64>> = buffer
            .channels()
            .iter()
            .map(|ch| self.filter.weight_channel(ch))
            .collect();

        if frames as f64 > block_frames {
            let step = 1.0 - GATING_BLOCK_OVERLAP;
            let total_secs = frames as f64 / rate;
            let num_blocks =
                ((total_secs - GATING_BLOCK_SECS) / (GATING_BLOCK_SECS * step)).round() as usize + 1;

            let mut energy = vec![vec![0.0_f64; num_blocks]; num_channels];
            for i in 0..num_channels {
                for j in 0..num_blocks {
                    let lower = (GATING_BLOCK_SECS * (j as f64 * step) * rate) as usize;
                    let upper =
                        ((GATING_BLOCK_SECS * (j as f64 * step + 1.0) * rate) as usize).min(frames);
                    let sum_sq: f64 = weighted[i][lower..upper].iter().map(|&s| s * s).sum();
                    energy[i][j] = sum_sq / (GATING_BLOCK_SECS * rate);
                }
            }

            let loudness = (0..num_blocks)
                .map(|j| {
                    block_loudness(
                        (0..num_channels)
                            .map(|i| CHANNEL_GAINS[i] * energy[i][j])
                            .sum(),
                    )
                })
                .collect();
            GatingBlocks { loudness, energy }
        } else {
            // The whole signal forms one (possibly partial) block, still
            // normalized by the nominal block length
            let energy: Vec<Vec<f64>> = weighted
                .iter()
                .map(|ch| vec![ch.iter().map(|&s| s * s).sum::<f64>() / (GATING_BLOCK_SECS * rate)])
                .collect();
            let loudness = vec![block_loudness(
                (0..num_channels)
                    .map(|i| CHANNEL_GAINS[i] * energy[i][0])
                    .sum(),
            )];
            GatingBlocks { loudness, energy }
        }
    }
}

/// Loudness of a weighted mean-square sum (eq. 4). Zero energy yields
/// negative infinity; NaN propagates.
fn block_loudness(weighted_mean_square: f64) -> f64 {
    LOUDNESS_OFFSET_DB + 10.0 * weighted_mean_square.log10()
}

fn weighted_sum(per_channel: &[f64]) -> f64 {
    per_channel
        .iter()
        .enumerate()
        .map(|(i, &z)| CHANNEL_GAINS[i] * z)
        .sum()
}
