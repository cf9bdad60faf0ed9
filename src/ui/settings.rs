use eframe::egui::{self, Ui};
use fieldscope::Settings;
use fieldscope::config::{
    BANDS_PER_DECADE_MAX, BANDS_PER_DECADE_MIN, FFT_ORDER_MAX, FFT_ORDER_MIN, HISTORY_WIDTH_MAX,
    HISTORY_WIDTH_MIN, HOPS_PER_PROCESS_MAX,
};

fn param_slider<T>(ui: &mut Ui, value: &mut T, range: std::ops::RangeInclusive<T>, text: &str) -> bool
where
    T: egui::emath::Numeric,
{
    ui.horizontal(|ui| {
        ui.label(text);
        ui.add(egui::Slider::new(value, range).text(""))
    })
    .inner
    .changed()
}

/// Edit `settings` in place. Returns true when anything changed.
pub fn draw_settings(ui: &mut Ui, settings: &mut Settings) -> bool {
    let mut changed = false;

    changed |= param_slider(ui, &mut settings.fft_order, FFT_ORDER_MIN..=FFT_ORDER_MAX, "FFT order");
    changed |= param_slider(ui, &mut settings.hop_divisor, 1..=8, "Hop divisor");
    ui.label(format!(
        "FFT {} / hop {}",
        settings.fft_size(),
        settings.hop_size()
    ));

    ui.separator();
    changed |= param_slider(ui, &mut settings.f_min, 10.0..=1000.0, "Low (Hz)");
    changed |= param_slider(ui, &mut settings.f_max, 1000.0..=24000.0, "High (Hz)");
    changed |= param_slider(
        ui,
        &mut settings.bands_per_decade,
        BANDS_PER_DECADE_MIN..=BANDS_PER_DECADE_MAX,
        "Bands/decade",
    );

    ui.separator();
    changed |= param_slider(ui, &mut settings.energy_gate_db, -120.0..=0.0, "Gate (dB)");
    changed |= param_slider(ui, &mut settings.gate_hyst_db, 0.0..=12.0, "Hysteresis (dB)");
    changed |= param_slider(ui, &mut settings.attack_coeff, 0.0..=1.0, "Attack");
    changed |= param_slider(ui, &mut settings.release_coeff, 0.0..=1.0, "Release");

    ui.separator();
    changed |= param_slider(
        ui,
        &mut settings.history_width_px,
        HISTORY_WIDTH_MIN..=HISTORY_WIDTH_MAX,
        "History (px)",
    );
    changed |= param_slider(ui, &mut settings.hops_per_process, 1..=HOPS_PER_PROCESS_MAX, "Hops/frame");
    changed |= ui.checkbox(&mut settings.enable_pre, "Pre path").changed();

    if ui.button("Defaults").clicked() {
        *settings = Settings::default();
        changed = true;
    }

    changed
}
