//! Loudness matching
//!
//! Rescales a signal from a measured loudness to a target loudness. Gain is
//! purely multiplicative; nothing here limits or clips, so driving a signal
//! toward a hot target can push samples beyond full scale (a warning is
//! logged, the samples are left as they are).

use talkover_core::AudioBuffer;
use tracing::warn;

/// Scale `buffer` so a signal measured at `measured_lufs` sits at
/// `target_lufs`. Returns the linear gain that was applied.
pub fn normalize_loudness(buffer: &mut AudioBuffer, measured_lufs: f64, target_lufs: f64) -> f32 {
    let gain_db = target_lufs - measured_lufs;
    let gain = 10.0_f64.powf(gain_db / 20.0) as f32;
    buffer.scale(gain);

    let peak = buffer.peak();
    if peak > 1.0 {
        warn!(peak, gain_db, "normalized signal exceeds full scale");
    }
    gain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::LoudnessMeter;

    #[test]
    fn gain_matches_level_difference() {
        let mut buf = AudioBuffer::mono(vec![0.1; 100], 48000).unwrap();
        // +20 dB is a factor of 10
        let gain = normalize_loudness(&mut buf, -40.0, -20.0);
        assert!((gain - 10.0).abs() < 1e-4);
        assert!((buf.channel(0)[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn normalized_signal_measures_at_target() {
        let rate = 48000_u32;
        let meter = LoudnessMeter::new(rate);
        let samples: Vec<f32> = (0..(3 * rate) as usize)
            .map(|n| {
                0.2 * (2.0 * std::f64::consts::PI * 997.0 * n as f64 / f64::from(rate)).sin() as f32
            })
            .collect();
        let mut buf = AudioBuffer::mono(samples, rate).unwrap();

        let measured = meter.measure(&buf).unwrap();
        normalize_loudness(&mut buf, measured, -30.0);
        let after = meter.measure(&buf).unwrap();
        assert!(
            (after - (-30.0)).abs() < 0.1,
            "expected -30 LUFS after matching, got {after}"
        );
    }
}
