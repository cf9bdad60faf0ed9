pub const BUFFER_SIZE: usize = 512;

pub const FFT_ORDER: u32 = 11;
pub const FFT_ORDER_MIN: u32 = 8;
pub const FFT_ORDER_MAX: u32 = 13;
pub const HOP_DIVISOR: usize = 2;

pub const F_MIN: f32 = 20.0;
pub const F_MAX: f32 = 20000.0;
pub const BANDS_PER_DECADE: f32 = 12.0;
pub const BANDS_PER_DECADE_MIN: f32 = 1.0;
pub const BANDS_PER_DECADE_MAX: f32 = 48.0;
pub const MIN_BANDS: usize = 4;

pub const HISTORY_WIDTH: usize = 512;
pub const HISTORY_WIDTH_MIN: usize = 64;
pub const HISTORY_WIDTH_MAX: usize = 4096;

pub const ENERGY_GATE_DB: f32 = -60.0;
pub const GATE_HYST_DB: f32 = 3.0;
pub const ATTACK_COEFF: f32 = 0.6;
pub const RELEASE_COEFF: f32 = 0.15;

pub const HOPS_PER_PROCESS: usize = 2;
pub const HOPS_PER_PROCESS_MAX: usize = 16;

/// Stereo frames held by each ingest ring, well above the largest hop (8192).
pub const DEFAULT_INGEST_CAPACITY: usize = 1 << 16;

pub const SAMPLE_RATE: u32 = 48000;
pub const SAMPLE_RATE_MIN: f32 = 1000.0;

/// Analyzer configuration. Every field is clamped by [`Settings::sanitized`]
/// rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub fft_order: u32,
    pub hop_divisor: usize,
    pub f_min: f32,
    pub f_max: f32,
    pub bands_per_decade: f32,
    pub history_width_px: usize,
    pub energy_gate_db: f32,
    pub gate_hyst_db: f32,
    pub attack_coeff: f32,
    pub release_coeff: f32,
    pub enable_pre: bool,
    pub hops_per_process: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fft_order: FFT_ORDER,
            hop_divisor: HOP_DIVISOR,
            f_min: F_MIN,
            f_max: F_MAX,
            bands_per_decade: BANDS_PER_DECADE,
            history_width_px: HISTORY_WIDTH,
            energy_gate_db: ENERGY_GATE_DB,
            gate_hyst_db: GATE_HYST_DB,
            attack_coeff: ATTACK_COEFF,
            release_coeff: RELEASE_COEFF,
            enable_pre: false,
            hops_per_process: HOPS_PER_PROCESS,
        }
    }
}

impl Settings {
    pub fn sanitized(self) -> Self {
        let fft_order = self.fft_order.clamp(FFT_ORDER_MIN, FFT_ORDER_MAX);
        let fft_size = 1usize << fft_order;
        let hop_divisor = self.hop_divisor.clamp(1, fft_size);

        let f_min = if self.f_min.is_finite() { self.f_min.max(1.0) } else { F_MIN };
        let mut f_max = if self.f_max.is_finite() { self.f_max } else { F_MAX };
        if f_max <= f_min {
            f_max = f_min * 2.0;
        }

        let bands_per_decade = if self.bands_per_decade.is_finite() && self.bands_per_decade > 0.0 {
            self.bands_per_decade.clamp(BANDS_PER_DECADE_MIN, BANDS_PER_DECADE_MAX)
        } else {
            BANDS_PER_DECADE
        };

        let energy_gate_db = if self.energy_gate_db.is_finite() {
            self.energy_gate_db
        } else {
            ENERGY_GATE_DB
        };
        let gate_hyst_db = if self.gate_hyst_db.is_finite() {
            self.gate_hyst_db.max(0.0)
        } else {
            GATE_HYST_DB
        };

        Self {
            fft_order,
            hop_divisor,
            f_min,
            f_max,
            bands_per_decade,
            history_width_px: clamp_history_width(self.history_width_px),
            energy_gate_db,
            gate_hyst_db,
            attack_coeff: clamp_coeff(self.attack_coeff, ATTACK_COEFF),
            release_coeff: clamp_coeff(self.release_coeff, RELEASE_COEFF),
            enable_pre: self.enable_pre,
            hops_per_process: self.hops_per_process.clamp(1, HOPS_PER_PROCESS_MAX),
        }
    }

    pub fn fft_size(&self) -> usize {
        1 << self.fft_order
    }

    pub fn hop_size(&self) -> usize {
        (self.fft_size() / self.hop_divisor.max(1)).max(1)
    }
}

pub fn clamp_history_width(px: usize) -> usize {
    px.clamp(HISTORY_WIDTH_MIN, HISTORY_WIDTH_MAX)
}

fn clamp_coeff(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { fallback }
}
