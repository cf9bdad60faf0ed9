use apodize::hanning_iter;
use rustfft::{Fft, FftPlanner, num_complex::Complex32};
use std::sync::Arc;

/// Hann-windowed forward FFT of both channels of a frame.
pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex32>,
    /// Scales bins so a full-scale sine reads ~1.0 in magnitude.
    scale: f32,
    pub spectrum_left: Vec<Complex32>,
    pub spectrum_right: Vec<Complex32>,
}

impl SpectralTransform {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let window: Vec<f32> = hanning_iter(fft_size).map(|x| x as f32).collect();

        let window_sum: f32 = window.iter().sum();
        let scale = if window_sum > f32::EPSILON { 2.0 / window_sum } else { 0.0 };

        Self {
            scratch: vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()],
            fft,
            window,
            scale,
            spectrum_left: vec![Complex32::new(0.0, 0.0); fft_size],
            spectrum_right: vec![Complex32::new(0.0, 0.0); fft_size],
        }
    }

    pub fn process(&mut self, left: &[f32], right: &[f32]) {
        Self::transform_channel(
            &*self.fft,
            &self.window,
            self.scale,
            &mut self.scratch,
            left,
            &mut self.spectrum_left,
        );
        Self::transform_channel(
            &*self.fft,
            &self.window,
            self.scale,
            &mut self.scratch,
            right,
            &mut self.spectrum_right,
        );
    }

    fn transform_channel(
        fft: &dyn Fft<f32>,
        window: &[f32],
        scale: f32,
        scratch: &mut [Complex32],
        frame: &[f32],
        out: &mut [Complex32],
    ) {
        for ((bin, &sample), &w) in out.iter_mut().zip(frame).zip(window) {
            *bin = Complex32::new(sample * w * scale, 0.0);
        }
        fft.process_with_scratch(out, scratch);
    }
}
