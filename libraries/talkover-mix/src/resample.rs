//! Offline sample-rate conversion via rubato
//!
//! The pipeline converts whole buffers at once: the recording down to the
//! synthesis rate, the finished mix back up. This wraps rubato's
//! `SincFixedIn` for that offline case: feed fixed chunks, flush the tail
//! with a partial call, then drop the filter delay so the output lines up
//! with the input.

use crate::collab::SampleRateConverter;
use crate::error::{MixError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use talkover_core::AudioBuffer;

const CHUNK_FRAMES: usize = 1024;

/// Whole-buffer sinc resampler.
///
/// Output length is `ceil(input_frames * ratio)`; equal rates pass the
/// buffer through untouched.
#[derive(Debug, Clone, Default)]
pub struct RubatoConverter;

impl RubatoConverter {
    pub fn new() -> Self {
        Self
    }

    fn interpolation_params() -> SincInterpolationParameters {
        SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris,
        }
    }
}

impl SampleRateConverter for RubatoConverter {
    fn resample(&mut self, buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
        if buffer.sample_rate() == target_rate {
            return Ok(buffer.clone());
        }

        let num_channels = buffer.num_channels();
        let frames = buffer.num_frames();
        let ratio = f64::from(target_rate) / f64::from(buffer.sample_rate());
        let expected = (frames as f64 * ratio).ceil() as usize;

        if frames == 0 {
            return Ok(AudioBuffer::silence(num_channels, 0, target_rate)?);
        }

        let mut resampler = SincFixedIn::<f32>::new(
            ratio,
            2.0,
            Self::interpolation_params(),
            CHUNK_FRAMES,
            num_channels,
        )
        .map_err(|e| MixError::Resample(format!("SincFixedIn creation failed: {e}")))?;
        let delay = resampler.output_delay();

        fn append(chunks: Vec<Vec<f32>>, produced: &mut [Vec<f32>]) {
            for (out, chunk) in produced.iter_mut().zip(chunks) {
                out.extend(chunk);
            }
        }
        let mut produced: Vec<Vec<f32>> =
            vec![Vec::with_capacity(expected + delay + CHUNK_FRAMES); num_channels];

        // Full chunks
        let mut pos = 0;
        while pos + CHUNK_FRAMES <= frames {
            let input: Vec<&[f32]> = buffer
                .channels()
                .iter()
                .map(|ch| &ch[pos..pos + CHUNK_FRAMES])
                .collect();
            let out = resampler
                .process(&input, None)
                .map_err(|e| MixError::Resample(format!("sinc resampling failed: {e}")))?;
            append(out, &mut produced);
            pos += CHUNK_FRAMES;
        }

        // Remaining partial chunk
        if pos < frames {
            let input: Vec<&[f32]> = buffer.channels().iter().map(|ch| &ch[pos..]).collect();
            let out = resampler
                .process_partial(Some(&input), None)
                .map_err(|e| MixError::Resample(format!("sinc flush failed: {e}")))?;
            append(out, &mut produced);
        }

        // Drain the filter tail until the delay plus the expected output is
        // covered
        while produced[0].len() < delay + expected {
            let out = resampler
                .process_partial(None::<&[&[f32]]>, None)
                .map_err(|e| MixError::Resample(format!("sinc drain failed: {e}")))?;
            if out[0].is_empty() {
                break;
            }
            append(out, &mut produced);
        }

        let channels: Vec<Vec<f32>> = produced
            .into_iter()
            .map(|ch| {
                let mut ch: Vec<f32> = ch.into_iter().skip(delay).take(expected).collect();
                ch.resize(expected, 0.0);
                ch
            })
            .collect();
        Ok(AudioBuffer::new(channels, target_rate)?)
    }
}
