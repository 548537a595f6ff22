//! K-weighting filter cascade
//!
//! Two fixed biquad stages per ITU-R BS.1770: a +4 dB high shelf at 1500 Hz
//! modeling the acoustic response of the head, followed by a 38 Hz high pass.
//! Coefficients come from the standard audio-EQ cookbook design equations and
//! are derived once per sample rate; applying a stage is a transposed
//! direct-form II difference equation carrying two state registers.

/// One second-order IIR stage, coefficients normalized by a0.
#[derive(Debug, Clone, Copy)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// High shelf boosting above `frequency` by `gain_db`.
    fn high_shelf(gain_db: f64, q: f64, frequency: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let w0 = 2.0 * std::f64::consts::PI * frequency / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let beta = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) + (a - 1.0) * cos_w0 + beta);
        let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) + (a - 1.0) * cos_w0 - beta);
        let a0 = (a + 1.0) - (a - 1.0) * cos_w0 + beta;
        let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) - (a - 1.0) * cos_w0 - beta;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// High pass with cutoff at `frequency`.
    fn high_pass(q: f64, frequency: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * frequency / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = (1.0 + cos_w0) / 2.0;
        let b1 = -(1.0 + cos_w0);
        let b2 = (1.0 + cos_w0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Run the difference equation over `samples` with fresh state.
    fn apply(&self, samples: &mut [f64]) {
        let mut z1 = 0.0_f64;
        let mut z2 = 0.0_f64;
        for sample in samples.iter_mut() {
            let x = *sample;
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            *sample = y;
        }
    }
}

/// The fixed two-stage K-weighting cascade for one sample rate.
///
/// Stateless between calls: each [`weight_channel`](Self::weight_channel)
/// starts from zeroed registers, so measurements are independent and channels
/// never share filter state.
#[derive(Debug, Clone)]
pub struct KWeightingFilter {
    stages: [BiquadCoeffs; 2],
}

impl KWeightingFilter {
    /// Shelf gain in dB at high frequencies
    const SHELF_GAIN_DB: f64 = 4.0;
    /// Shelf center frequency in Hz
    const SHELF_FREQ_HZ: f64 = 1500.0;
    /// High-pass cutoff in Hz
    const HIGH_PASS_FREQ_HZ: f64 = 38.0;
    /// High-pass Q
    const HIGH_PASS_Q: f64 = 0.5;

    pub fn new(sample_rate: u32) -> Self {
        let rate = f64::from(sample_rate);
        Self {
            stages: [
                BiquadCoeffs::high_shelf(
                    Self::SHELF_GAIN_DB,
                    std::f64::consts::FRAC_1_SQRT_2,
                    Self::SHELF_FREQ_HZ,
                    rate,
                ),
                BiquadCoeffs::high_pass(Self::HIGH_PASS_Q, Self::HIGH_PASS_FREQ_HZ, rate),
            ],
        }
    }

    /// Filter one channel into a fresh f64 working copy.
    ///
    /// The caller's samples are never mutated; the meter accumulates block
    /// energies from the returned copy.
    pub fn weight_channel(&self, samples: &[f32]) -> Vec<f64> {
        let mut filtered: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
        for stage in &self.stages {
            stage.apply(&mut filtered);
        }
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// |H(e^jw)| of one stage at frequency `hz`.
    fn magnitude(coeffs: &BiquadCoeffs, hz: f64, rate: f64) -> f64 {
        let w = 2.0 * std::f64::consts::PI * hz / rate;
        let num_re = coeffs.b0 + coeffs.b1 * w.cos() + coeffs.b2 * (2.0 * w).cos();
        let num_im = -(coeffs.b1 * w.sin() + coeffs.b2 * (2.0 * w).sin());
        let den_re = 1.0 + coeffs.a1 * w.cos() + coeffs.a2 * (2.0 * w).cos();
        let den_im = -(coeffs.a1 * w.sin() + coeffs.a2 * (2.0 * w).sin());
        (num_re * num_re + num_im * num_im).sqrt() / (den_re * den_re + den_im * den_im).sqrt()
    }

    #[test]
    fn high_shelf_response() {
        let rate = 48000.0;
        let shelf =
            BiquadCoeffs::high_shelf(4.0, std::f64::consts::FRAC_1_SQRT_2, 1500.0, rate);

        // Unity at DC, the full +4 dB at Nyquist
        assert!((magnitude(&shelf, 0.0, rate) - 1.0).abs() < 1e-9);
        let nyquist_db = 20.0 * magnitude(&shelf, rate / 2.0, rate).log10();
        assert!(
            (nyquist_db - 4.0).abs() < 0.05,
            "shelf gain at Nyquist was {nyquist_db} dB"
        );
    }

    #[test]
    fn high_pass_response() {
        let rate = 48000.0;
        let hp = BiquadCoeffs::high_pass(0.5, 38.0, rate);

        // Blocks DC exactly (numerator sums to zero), passes the audio band
        assert!(magnitude(&hp, 0.0, rate) < 1e-9);
        assert!((magnitude(&hp, 1000.0, rate) - 1.0).abs() < 0.01);
    }

    #[test]
    fn weighting_leaves_input_untouched() {
        let filter = KWeightingFilter::new(48000);
        let input = vec![0.5_f32; 480];
        let copy = input.clone();
        let filtered = filter.weight_channel(&input);
        assert_eq!(input, copy);
        assert_eq!(filtered.len(), input.len());
    }

    #[test]
    fn silence_stays_silent() {
        let filter = KWeightingFilter::new(44100);
        let silence = vec![0.0_f32; 4410];
        let filtered = filter.weight_channel(&silence);
        assert!(filtered.iter().all(|&s| s == 0.0));
    }
}
