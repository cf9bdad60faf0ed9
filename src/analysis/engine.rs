//! The stereo field engine: pulls hops from the ingest rings, runs the STFT,
//! correlates every band and scrolls the result into the history images.
//!
//! Everything here runs on the consumer thread. The audio thread only ever
//! touches the [`AudioFeed`] returned by [`StereoFieldEngine::new`].

use std::sync::atomic::Ordering;

use super::bands::{Band, build_bands};
use super::color::ColorMap;
use super::correlator::{GateParams, update_band};
use super::frame::FrameAssembler;
use super::history::HistoryImage;
use super::ingest::{self, AudioFeed, IngestChannels, IngestConsumer, SignalPath, StereoSample};
use super::transform::SpectralTransform;
use crate::config::{
    DEFAULT_INGEST_CAPACITY, SAMPLE_RATE, SAMPLE_RATE_MIN, Settings, clamp_history_width,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unprepared,
    Prepared,
    Processing,
}

/// Analysis state of one signal path. Rebuilt wholesale on reconfiguration.
struct PathAnalyzer {
    assembler: FrameAssembler,
    transform: SpectralTransform,
    bands: Vec<Band>,
    image: HistoryImage,
    write_x: usize,
    widths: Vec<f32>,
    correlations: Vec<f32>,
}

impl PathAnalyzer {
    fn new(settings: &Settings, geometry: &[Band]) -> Self {
        let fft_size = settings.fft_size();
        Self {
            assembler: FrameAssembler::new(fft_size),
            transform: SpectralTransform::new(fft_size),
            bands: geometry.to_vec(),
            image: HistoryImage::new(settings.history_width_px, geometry.len()),
            write_x: 0,
            widths: vec![0.0; geometry.len()],
            correlations: vec![0.0; geometry.len()],
        }
    }

    /// Pop and process up to `max_hops` hops. Returns the number of columns
    /// written.
    fn drain(
        &mut self,
        consumer: &mut IngestConsumer,
        hop: &mut [StereoSample],
        max_hops: usize,
        frozen: bool,
        params: &GateParams,
        colors: &ColorMap,
    ) -> usize {
        let mut columns = 0;
        for _ in 0..max_hops {
            if !consumer.pop_hop(hop) {
                break;
            }
            self.assembler.push_hop(hop);
            if frozen || !self.assembler.is_primed() {
                continue;
            }
            self.analyze(params, colors);
            columns += 1;
        }
        columns
    }

    fn analyze(&mut self, params: &GateParams, colors: &ColorMap) {
        self.transform
            .process(&self.assembler.left, &self.assembler.right);

        let x = self.write_x;
        for (i, band) in self.bands.iter_mut().enumerate() {
            let reading = update_band(
                band,
                &self.transform.spectrum_left,
                &self.transform.spectrum_right,
                params,
            );
            self.widths[i] = reading.width;
            self.correlations[i] = reading.correlation;
            self.image.set_band_pixel(x, i, colors.color_for(band.r_smooth));
        }

        let width = self.image.width().max(1);
        self.write_x = (self.write_x + 1) % width;
    }
}

pub struct StereoFieldEngine {
    state: EngineState,
    frozen: bool,
    sample_rate: f32,
    settings: Settings,
    ingest: IngestChannels,
    hop: Vec<StereoSample>,
    geometry: Vec<Band>,
    colors: ColorMap,
    post: Option<PathAnalyzer>,
    pre: Option<PathAnalyzer>,
    dropped_frames: usize,
}

impl StereoFieldEngine {
    /// Create an unprepared engine and the feed for the audio thread.
    pub fn new() -> (Self, AudioFeed) {
        Self::with_capacity(DEFAULT_INGEST_CAPACITY)
    }

    /// Like [`StereoFieldEngine::new`] with `capacity` stereo frames per ring.
    pub fn with_capacity(capacity: usize) -> (Self, AudioFeed) {
        let (feed, ingest) = ingest::channels(capacity);
        let engine = Self {
            state: EngineState::Unprepared,
            frozen: false,
            sample_rate: SAMPLE_RATE as f32,
            settings: Settings::default(),
            ingest,
            hop: Vec::new(),
            geometry: Vec::new(),
            colors: ColorMap::default(),
            post: None,
            pre: None,
            dropped_frames: 0,
        };
        (engine, feed)
    }

    /// Full (re)initialization for a sample rate and settings. Rates below
    /// 1 kHz are raised to 1 kHz.
    pub fn prepare(&mut self, sample_rate: f32, settings: Settings) {
        self.sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate.max(SAMPLE_RATE_MIN)
        } else {
            SAMPLE_RATE as f32
        };
        self.settings = settings.sanitized();
        self.rebuild();
    }

    pub fn set_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        if settings == self.settings {
            return;
        }
        self.settings = settings;
        if self.state != EngineState::Unprepared {
            self.rebuild();
        }
    }

    pub fn set_history_width(&mut self, px: usize) {
        self.set_settings(Settings {
            history_width_px: clamp_history_width(px),
            ..self.settings
        });
    }

    pub fn set_enable_pre(&mut self, enable: bool) {
        self.set_settings(Settings {
            enable_pre: enable,
            ..self.settings
        });
    }

    /// Stop emitting columns. Ingest keeps draining while frozen.
    pub fn set_freeze(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn set_color_map(&mut self, colors: ColorMap) {
        self.colors = colors;
    }

    fn rebuild(&mut self) {
        let settings = self.settings;
        self.geometry = build_bands(
            settings.f_min,
            settings.f_max,
            settings.bands_per_decade,
            settings.fft_size(),
            self.sample_rate,
        );
        self.hop = vec![StereoSample::default(); settings.hop_size()];
        self.post = Some(PathAnalyzer::new(&settings, &self.geometry));
        self.pre = settings
            .enable_pre
            .then(|| PathAnalyzer::new(&settings, &self.geometry));

        self.ingest
            .shared
            .pre_enabled
            .store(settings.enable_pre, Ordering::Release);
        // A push that read the flag before this store may still land, so the
        // pre ring is emptied on every rebuild, enabled or not.
        self.ingest.pre.discard_all();

        self.state = EngineState::Prepared;

        log::info!(
            "stereo field rebuilt: {} Hz, fft {} / hop {}, {} bands, {} px history, pre {}",
            self.sample_rate,
            settings.fft_size(),
            settings.hop_size(),
            self.geometry.len(),
            settings.history_width_px,
            if settings.enable_pre { "on" } else { "off" },
        );
    }

    /// Pull and analyze at most `hops_per_process` hops per path. Returns the
    /// number of columns written to the post image. Without a complete hop
    /// this is a no-op.
    pub fn process(&mut self) -> usize {
        if self.state == EngineState::Unprepared {
            return 0;
        }
        self.collect_dropped();

        let params = GateParams {
            threshold_db: self.settings.energy_gate_db,
            hyst_db: self.settings.gate_hyst_db,
            attack: self.settings.attack_coeff,
            release: self.settings.release_coeff,
        };
        let max_hops = self.settings.hops_per_process;

        let mut columns = 0;
        if let Some(post) = self.post.as_mut() {
            columns = post.drain(
                &mut self.ingest.post,
                &mut self.hop,
                max_hops,
                self.frozen,
                &params,
                &self.colors,
            );
        }

        let mut pre_columns = 0;
        if let Some(pre) = self.pre.as_mut() {
            pre_columns = pre.drain(
                &mut self.ingest.pre,
                &mut self.hop,
                max_hops,
                self.frozen,
                &params,
                &self.colors,
            );
        }

        if columns + pre_columns > 0 {
            self.state = EngineState::Processing;
        }
        columns
    }

    fn collect_dropped(&mut self) {
        let shared = &self.ingest.shared;
        let dropped = shared.dropped_post.swap(0, Ordering::Relaxed)
            + shared.dropped_pre.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            self.dropped_frames += dropped;
            log::warn!("ingest full, {} frames dropped ({} total)", dropped, self.dropped_frames);
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn image_post(&self) -> Option<&HistoryImage> {
        self.post.as_ref().map(|p| &p.image)
    }

    pub fn image_pre(&self) -> Option<&HistoryImage> {
        self.pre.as_ref().map(|p| &p.image)
    }

    pub fn write_x(&self) -> usize {
        self.post.as_ref().map_or(0, |p| p.write_x)
    }

    pub fn write_x_pre(&self) -> usize {
        self.pre.as_ref().map_or(0, |p| p.write_x)
    }

    pub fn band_count(&self) -> usize {
        self.geometry.len()
    }

    pub fn band_center_hz(&self, index: usize) -> Option<f32> {
        self.geometry.get(index).map(|b| b.f_c)
    }

    pub fn width_per_band_post(&self) -> &[f32] {
        self.post.as_ref().map(|p| p.widths.as_slice()).unwrap_or_default()
    }

    /// Gated correlation of the latest post hop per band, before smoothing.
    pub fn correlation_per_band_post(&self) -> &[f32] {
        self.post.as_ref().map(|p| p.correlations.as_slice()).unwrap_or_default()
    }

    /// Band table of the post path, including its gate and smoothing state.
    pub fn bands_post(&self) -> &[Band] {
        self.post.as_ref().map(|p| p.bands.as_slice()).unwrap_or_default()
    }

    pub fn bands_pre(&self) -> &[Band] {
        self.pre.as_ref().map(|p| p.bands.as_slice()).unwrap_or_default()
    }

    pub fn color_map(&self) -> &ColorMap {
        &self.colors
    }

    /// Frames waiting in the ring of `path`.
    pub fn pending_frames(&self, path: SignalPath) -> usize {
        match path {
            SignalPath::Post => self.ingest.post.available(),
            SignalPath::Pre => self.ingest.pre.available(),
        }
    }

    /// Frames the audio thread could not store because a ring was full,
    /// as of the last `process()` call.
    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::history::BACKGROUND;
    use std::f32::consts::TAU;

    fn scenario_settings() -> Settings {
        Settings {
            fft_order: 11,
            hop_divisor: 2,
            ..Settings::default()
        }
    }

    fn prepared(settings: Settings) -> (StereoFieldEngine, AudioFeed) {
        let (mut engine, feed) = StereoFieldEngine::new();
        engine.prepare(48000.0, settings);
        (engine, feed)
    }

    fn sine(freq: f32, amplitude: f32, len: usize, sample_rate: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (TAU * freq * n as f32 / sample_rate).sin())
            .collect()
    }

    fn band_index_for(engine: &StereoFieldEngine, hz: f32) -> usize {
        engine
            .bands_post()
            .iter()
            .position(|b| b.f_lo <= hz && hz < b.f_hi)
            .unwrap()
    }

    fn run_until_drained(engine: &mut StereoFieldEngine) {
        while engine.pending_frames(SignalPath::Post) >= engine.settings().hop_size() {
            engine.process();
        }
    }

    #[test]
    fn unprepared_engine_does_nothing() {
        let (mut engine, mut feed) = StereoFieldEngine::new();
        feed.push(&[0.5; 4096], None, SignalPath::Post);
        assert_eq!(engine.process(), 0);
        assert_eq!(engine.state(), EngineState::Unprepared);
        assert!(engine.image_post().is_none());
        assert_eq!(engine.band_count(), 0);
        assert_eq!(engine.band_center_hz(0), None);
    }

    #[test]
    fn silent_hops_write_one_neutral_column() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        assert_eq!(engine.settings().hop_size(), 1024);
        let silence = [0.0f32; 1024];
        feed.push(&silence, Some(&silence), SignalPath::Post);
        feed.push(&silence, Some(&silence), SignalPath::Post);

        assert_eq!(engine.process(), 1);
        assert_eq!(engine.write_x(), 1);
        assert_eq!(engine.state(), EngineState::Processing);

        let image = engine.image_post().unwrap();
        let neutral = engine.color_map().neutral();
        assert_eq!(image.height(), engine.band_count());
        for band in 0..engine.band_count() {
            assert!(!engine.bands_post()[band].gate_open);
            assert_eq!(image.band_pixel(0, band), Some(neutral));
            assert_eq!(image.band_pixel(1, band), Some(BACKGROUND));
        }
    }

    #[test]
    fn mono_tone_opens_its_band_and_reads_narrow() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        let tone = sine(1000.0, 0.5, 2048, 48000.0);
        feed.push(&tone, Some(&tone), SignalPath::Post);

        assert_eq!(engine.process(), 1);

        let index = band_index_for(&engine, 1000.0);
        let band = engine.bands_post()[index];
        assert!(band.gate_open);
        assert!(band.r_smooth > 0.5, "r_smooth {}", band.r_smooth);
        assert!(engine.width_per_band_post()[index] < 0.01);
    }

    #[test]
    fn mono_content_converges_to_plus_one() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        let tone = sine(1000.0, 0.5, 1024 * 20, 48000.0);
        feed.push(&tone, None, SignalPath::Post);
        run_until_drained(&mut engine);

        let index = band_index_for(&engine, 1000.0);
        assert!(engine.bands_post()[index].r_smooth > 0.99);
        for band in engine.bands_post() {
            assert!((-1.0..=1.0).contains(&band.r_smooth));
            if band.gate_open {
                assert!(band.r_smooth > 0.9, "{band:?}");
            }
        }
        for &width in engine.width_per_band_post() {
            assert!((0.0..=2.0).contains(&width));
        }
    }

    #[test]
    fn inverted_content_converges_to_minus_one() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        let left = sine(440.0, 0.5, 1024 * 20, 48000.0);
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        feed.push(&left, Some(&right), SignalPath::Post);
        run_until_drained(&mut engine);

        let index = band_index_for(&engine, 440.0);
        assert!(engine.bands_post()[index].r_smooth < -0.99);
        assert_eq!(engine.width_per_band_post()[index], 2.0);
    }

    #[test]
    fn process_without_a_hop_changes_nothing() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        let tone = sine(500.0, 0.5, 2048 + 100, 48000.0);
        feed.push(&tone, None, SignalPath::Post);
        engine.process();

        let pixels = engine.image_post().unwrap().pixels().to_vec();
        let bands = engine.bands_post().to_vec();
        let write_x = engine.write_x();

        assert_eq!(engine.process(), 0);
        assert_eq!(engine.image_post().unwrap().pixels(), pixels.as_slice());
        assert_eq!(engine.bands_post(), bands.as_slice());
        assert_eq!(engine.write_x(), write_x);
        assert_eq!(engine.pending_frames(SignalPath::Post), 100);
    }

    #[test]
    fn catch_up_is_bounded_per_call() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        feed.push(&[0.0; 1024 * 6], None, SignalPath::Post);

        assert_eq!(engine.process(), 1);
        assert_eq!(engine.pending_frames(SignalPath::Post), 1024 * 4);
        assert_eq!(engine.process(), 2);
        assert_eq!(engine.process(), 2);
        assert_eq!(engine.process(), 0);
        assert_eq!(engine.write_x(), 5);
    }

    #[test]
    fn cursor_wraps_around_the_image() {
        let settings = Settings {
            fft_order: 8,
            hop_divisor: 1,
            history_width_px: 64,
            hops_per_process: 16,
            ..Settings::default()
        };
        let (mut engine, mut feed) = prepared(settings);
        feed.push(&[0.0; 256 * 70], None, SignalPath::Post);
        run_until_drained(&mut engine);
        assert_eq!(engine.write_x(), 70 % 64);
    }

    #[test]
    fn history_width_round_trips_clamped() {
        let (mut engine, _feed) = prepared(Settings::default());
        for (requested, expected) in [(10, 64), (300, 300), (5000, 4096)] {
            engine.set_history_width(requested);
            assert_eq!(engine.image_post().unwrap().width(), expected);
            assert_eq!(engine.settings().history_width_px, expected);
        }
    }

    #[test]
    fn prepare_resets_cursor_and_images() {
        let settings = Settings {
            enable_pre: true,
            ..scenario_settings()
        };
        let (mut engine, mut feed) = prepared(settings);
        let tone = sine(1000.0, 0.5, 4096, 48000.0);
        feed.push(&tone, None, SignalPath::Post);
        feed.push(&tone, None, SignalPath::Pre);
        run_until_drained(&mut engine);
        assert!(engine.write_x() > 0);
        assert!(engine.write_x_pre() > 0);

        engine.prepare(44100.0, settings);
        assert_eq!(engine.state(), EngineState::Prepared);
        assert_eq!(engine.write_x(), 0);
        assert_eq!(engine.write_x_pre(), 0);
        for image in [engine.image_post().unwrap(), engine.image_pre().unwrap()] {
            assert!(image.pixels().iter().all(|&p| p == BACKGROUND));
        }
    }

    #[test]
    fn frozen_engine_drains_without_writing() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        engine.set_freeze(true);
        feed.push(&[0.0; 2048], None, SignalPath::Post);

        assert_eq!(engine.process(), 0);
        assert_eq!(engine.pending_frames(SignalPath::Post), 0);
        assert_eq!(engine.write_x(), 0);

        engine.set_freeze(false);
        feed.push(&[0.0; 1024], None, SignalPath::Post);
        assert_eq!(engine.process(), 1);
        assert_eq!(engine.write_x(), 1);
    }

    #[test]
    fn pre_path_is_analyzed_independently() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        assert!(engine.image_pre().is_none());
        assert_eq!(feed.push(&[0.0; 2048], None, SignalPath::Pre), 0);

        engine.set_enable_pre(true);
        let tone = sine(1000.0, 0.5, 2048, 48000.0);
        let inverted: Vec<f32> = tone.iter().map(|s| -s).collect();
        feed.push(&tone, None, SignalPath::Post);
        feed.push(&tone, Some(&inverted), SignalPath::Pre);

        assert_eq!(engine.process(), 1);
        assert_eq!(engine.write_x_pre(), 1);

        let index = band_index_for(&engine, 1000.0);
        assert!(engine.bands_post()[index].r_smooth > 0.5);
        assert!(engine.bands_pre()[index].r_smooth < -0.5);
        assert_eq!(
            engine.image_pre().unwrap().height(),
            engine.image_post().unwrap().height()
        );
    }

    #[test]
    fn unchanged_settings_do_not_rebuild() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        feed.push(&[0.0; 2048], None, SignalPath::Post);
        engine.process();
        engine.set_settings(scenario_settings());
        assert_eq!(engine.write_x(), 1);
        assert_eq!(engine.state(), EngineState::Processing);

        engine.set_settings(Settings {
            bands_per_decade: 6.0,
            ..scenario_settings()
        });
        assert_eq!(engine.write_x(), 0);
        assert_eq!(engine.state(), EngineState::Prepared);
        assert_eq!(engine.band_count(), 18);
    }

    #[test]
    fn band_centers_are_exposed_in_order() {
        let (engine, _feed) = prepared(Settings::default());
        let centers: Vec<f32> = (0..engine.band_count())
            .map(|i| engine.band_center_hz(i).unwrap())
            .collect();
        assert!(centers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(engine.band_center_hz(engine.band_count()), None);
    }

    #[test]
    fn sub_octave_range_keeps_requested_edges() {
        let settings = Settings {
            f_min: 1000.0,
            f_max: 1500.0,
            ..Settings::default()
        };
        let (engine, _feed) = prepared(settings);
        let bands = engine.bands_post();
        assert_eq!(bands[0].f_lo, settings.f_min);
        assert_eq!(bands.last().unwrap().f_hi, settings.f_max);
    }

    #[test]
    fn tiny_sample_rate_is_raised_to_the_floor() {
        let (mut engine, mut feed) = StereoFieldEngine::new();
        engine.prepare(1.0, Settings::default());
        assert_eq!(engine.sample_rate(), SAMPLE_RATE_MIN);
        assert!(engine.band_count() >= 4);

        feed.push(&[0.0; 2048], None, SignalPath::Post);
        assert_eq!(engine.process(), 1);
    }

    #[test]
    fn correlation_per_band_tracks_the_latest_hop() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        assert_eq!(engine.correlation_per_band_post().len(), engine.band_count());

        let left = sine(1000.0, 0.5, 2048, 48000.0);
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        feed.push(&left, Some(&right), SignalPath::Post);
        engine.process();

        let index = band_index_for(&engine, 1000.0);
        let correlations = engine.correlation_per_band_post();
        assert!(correlations[index] < -0.99, "{}", correlations[index]);
        assert!(correlations.iter().all(|r| (-1.0..=1.0).contains(r)));
        // Smoothing lags behind the raw value.
        assert!(engine.bands_post()[index].r_smooth > correlations[index]);
    }

    #[test]
    fn stale_pre_frames_are_dropped_on_enable() {
        let (mut engine, mut feed) = prepared(scenario_settings());
        let shared = engine.ingest.shared.clone();

        // A push that saw the flag just before it was cleared.
        shared.pre_enabled.store(true, Ordering::Release);
        feed.push(&[0.25; 2048], None, SignalPath::Pre);
        shared.pre_enabled.store(false, Ordering::Release);
        assert_eq!(engine.pending_frames(SignalPath::Pre), 2048);

        engine.set_enable_pre(true);
        assert_eq!(engine.pending_frames(SignalPath::Pre), 0);
        assert_eq!(engine.process(), 0);
        assert_eq!(engine.write_x_pre(), 0);
    }

    #[test]
    fn overflow_is_reported_by_process() {
        let (mut engine, mut feed) = StereoFieldEngine::with_capacity(4096);
        engine.prepare(48000.0, scenario_settings());
        feed.push(&[0.0; 5000], None, SignalPath::Post);
        engine.process();
        assert_eq!(engine.dropped_frames(), 904);
    }
}
