//! Logarithmic band table with fractional edge bins.

use crate::config::MIN_BANDS;

/// One display band: its frequency edges, the FFT bins it covers and the
/// running gate/smoothing state of the path that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub f_lo: f32,
    pub f_hi: f32,
    pub f_c: f32,
    pub k0: usize,
    pub k1: usize,
    /// Credit given to `k0`, `1 - frac(k_lo)`.
    pub w0: f32,
    /// Credit given to `k1`, `frac(k_hi)`.
    pub w1: f32,
    pub r_smooth: f32,
    pub gate_open: bool,
}

impl Band {
    fn new(f_lo: f32, f_hi: f32, fft_size: usize, sample_rate: f32, last_bin: usize) -> Self {
        let to_bin = |hz: f32| (hz * fft_size as f32 / sample_rate).clamp(0.0, last_bin as f32);
        let k_lo = to_bin(f_lo);
        let k_hi = to_bin(f_hi).max(k_lo);

        Self {
            f_lo,
            f_hi,
            f_c: (f_lo * f_hi).sqrt(),
            k0: k_lo.floor() as usize,
            k1: k_hi.floor() as usize,
            w0: 1.0 - k_lo.fract(),
            w1: k_hi.fract(),
            r_smooth: 0.0,
            gate_open: false,
        }
    }

    /// Visit every bin of the band with its weight. Edge bins get their
    /// fractional credit, interior bins 1.0. A band inside a single bin gets
    /// credit for exactly its own width.
    pub fn for_each_bin(&self, mut visit: impl FnMut(usize, f32)) {
        if self.k0 == self.k1 {
            visit(self.k0, (self.w0 + self.w1 - 1.0).max(0.0));
            return;
        }
        visit(self.k0, self.w0);
        for k in self.k0 + 1..self.k1 {
            visit(k, 1.0);
        }
        visit(self.k1, self.w1);
    }
}

/// `max(4, round(log10(f_max / f_min) * bands_per_decade))`
pub fn band_count(f_min: f32, f_max: f32, bands_per_decade: f32) -> usize {
    let decades = (f_max / f_min).log10().max(0.0);
    ((decades * bands_per_decade).round() as usize).max(MIN_BANDS)
}

/// Build the band table for `[f_min, f_max]`. The upper edge is capped at
/// Nyquist. Bands are contiguous and the last one always ends at `f_max`.
pub fn build_bands(
    f_min: f32,
    f_max: f32,
    bands_per_decade: f32,
    fft_size: usize,
    sample_rate: f32,
) -> Vec<Band> {
    let nyquist = sample_rate * 0.5;
    let f_max = f_max.min(nyquist).max(2.0);
    let mut f_min = f_min.max(1.0);
    if f_min >= f_max {
        // Only reachable when Nyquist pulled the top below the requested bottom.
        f_min = f_max * 0.5;
    }

    let count = band_count(f_min, f_max, bands_per_decade);
    let mut ratio = 10f32.powf(1.0 / bands_per_decade);
    if f_min * ratio.powi(count as i32 - 1) >= f_max {
        ratio = (f_max / f_min).powf(1.0 / count as f32);
    }

    let last_bin = fft_size / 2;
    let mut bands = Vec::with_capacity(count);
    let mut f_lo = f_min;
    for i in 0..count {
        let f_hi = if i + 1 == count {
            f_max
        } else {
            (f_lo * ratio).min(f_max)
        };
        bands.push(Band::new(f_lo, f_hi, fft_size, sample_rate, last_bin));
        if f_hi >= f_max {
            break;
        }
        f_lo = f_hi;
    }

    log::debug!(
        "built {} bands over {:.1}-{:.1} Hz (ratio {:.4}, fft {})",
        bands.len(),
        f_min,
        f_max,
        ratio,
        fft_size
    );

    bands
}
