use cpal::Host;
use eframe::{App, CreationContext, egui};

use fieldscope::Settings;
use fieldscope::analysis::{SignalPath, StereoFieldEngine};
use fieldscope::audio::devices::{get_input_device, init_devices};
use fieldscope::audio::{CaptureError, InputCapture};

use crate::ui::{draw_heatmap, draw_settings, draw_width_meter};

pub struct FieldScopeApp {
    host: Host,
    devices: Vec<String>,
    input_device_index: usize,
    capture: Option<InputCapture>,
    engine: StereoFieldEngine,
    settings: Settings,
    frozen: bool,
    texture: Option<egui::TextureHandle>,
    texture_pre: Option<egui::TextureHandle>,
    last_error: Option<String>,
}

impl FieldScopeApp {
    pub fn new(_cc: &CreationContext) -> Self {
        let host = cpal::default_host();
        let (devices, input_device_index) = init_devices(&host);
        let (engine, _feed) = StereoFieldEngine::new();

        Self {
            host,
            devices,
            input_device_index,
            capture: None,
            engine,
            settings: Settings::default(),
            frozen: false,
            texture: None,
            texture_pre: None,
            last_error: None,
        }
    }

    fn is_running(&self) -> bool {
        self.capture.is_some()
    }

    /// Each capture gets a fresh engine, since the feed moves into the stream.
    pub fn start_processing(&mut self) -> Result<(), CaptureError> {
        if self.is_running() {
            return Ok(());
        }

        let device = get_input_device(&self.host, &self.devices, self.input_device_index)?;
        let (mut engine, feed) = StereoFieldEngine::new();
        let capture = InputCapture::start(&device, feed)?;

        engine.prepare(capture.sample_rate() as f32, self.settings);
        engine.set_freeze(self.frozen);

        self.engine = engine;
        self.capture = Some(capture);
        self.texture = None;
        self.texture_pre = None;
        Ok(())
    }

    pub fn stop_processing(&mut self) {
        self.capture = None;
    }

    fn upload_images(&mut self, ctx: &egui::Context) {
        if let Some(image) = self.engine.image_post() {
            let view = image.unwrapped(self.engine.write_x());
            upload(ctx, &mut self.texture, "stereo-field", view);
        }
        match self.engine.image_pre() {
            Some(image) => {
                let view = image.unwrapped(self.engine.write_x_pre());
                upload(ctx, &mut self.texture_pre, "stereo-field-pre", view);
            }
            None => self.texture_pre = None,
        }
    }
}

fn upload(
    ctx: &egui::Context,
    slot: &mut Option<egui::TextureHandle>,
    name: &str,
    view: egui::ColorImage,
) {
    match slot.as_mut() {
        Some(texture) => texture.set(view, egui::TextureOptions::NEAREST),
        None => *slot = Some(ctx.load_texture(name, view, egui::TextureOptions::NEAREST)),
    }
}

impl App for FieldScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let running = self.is_running();

        if running {
            let columns = self.engine.process();
            let pre_missing = self.texture_pre.is_none() && self.engine.image_pre().is_some();
            if columns > 0 || self.texture.is_none() || pre_missing {
                self.upload_images(ctx);
            }
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                if ui
                    .button(if running { "Stop" } else { "Start" })
                    .clicked()
                {
                    if running {
                        self.stop_processing();
                    } else if let Err(e) = self.start_processing() {
                        log::error!("Failed to start processing: {}", e);
                        self.last_error = Some(e.to_string());
                    } else {
                        self.last_error = None;
                    }
                }

                if ui.checkbox(&mut self.frozen, "Freeze").changed() {
                    self.engine.set_freeze(self.frozen);
                }

                ui.separator();
                match (&self.capture, &self.last_error) {
                    (Some(capture), _) => {
                        ui.label(format!(
                            "{} @ {} Hz, {} ch | backlog {} | dropped {}",
                            capture.device_name(),
                            capture.sample_rate(),
                            capture.channels(),
                            self.engine.pending_frames(SignalPath::Post),
                            self.engine.dropped_frames()
                        ));
                    }
                    (None, Some(err)) => {
                        ui.colored_label(egui::Color32::from_rgb(255, 100, 100), err);
                    }
                    (None, None) => {
                        ui.label("Status: Stopped");
                    }
                }
            });
        });

        egui::SidePanel::right("settings_panel").show(ctx, |ui| {
            ui.heading("Input");

            let mut new_input_idx = self.input_device_index;
            egui::ComboBox::from_label("Device")
                .selected_text(
                    self.devices
                        .get(self.input_device_index)
                        .map(String::as_str)
                        .unwrap_or("None"),
                )
                .show_ui(ui, |ui| {
                    for (i, device_name) in self.devices.iter().enumerate() {
                        ui.selectable_value(&mut new_input_idx, i, device_name);
                    }
                });

            if new_input_idx != self.input_device_index {
                self.input_device_index = new_input_idx;
                if running {
                    self.stop_processing();
                    if let Err(e) = self.start_processing() {
                        log::error!("Failed to restart processing: {}", e);
                        self.last_error = Some(e.to_string());
                    }
                }
            }

            ui.separator();
            ui.heading("Analysis");
            if draw_settings(ui, &mut self.settings) {
                self.engine.set_settings(self.settings);
                self.texture = None;
                self.texture_pre = None;
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Stereo Field");
            let available = ui.available_height() - 70.0;
            if self.engine.image_pre().is_some() {
                let half = available * 0.5 - 20.0;
                draw_heatmap(ui, &self.engine, self.texture.as_ref(), half);
                ui.label("Pre");
                draw_heatmap(ui, &self.engine, self.texture_pre.as_ref(), half);
            } else {
                draw_heatmap(ui, &self.engine, self.texture.as_ref(), available);
            }
            draw_width_meter(ui, &self.engine);
        });
    }
}
