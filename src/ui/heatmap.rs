use eframe::egui;
use fieldscope::StereoFieldEngine;

const LABEL_FREQUENCIES: [(f32, &str); 10] = [
    (20.0, "20Hz"),
    (50.0, "50Hz"),
    (100.0, "100Hz"),
    (200.0, "200Hz"),
    (500.0, "500Hz"),
    (1000.0, "1kHz"),
    (2000.0, "2kHz"),
    (5000.0, "5kHz"),
    (10000.0, "10kHz"),
    (20000.0, "20kHz"),
];

/// Draw the scrolling correlation image with a frequency axis on the left.
/// The newest column is on the right.
pub fn draw_heatmap(
    ui: &mut egui::Ui,
    engine: &StereoFieldEngine,
    texture: Option<&egui::TextureHandle>,
    height: f32,
) {
    ui.group(|ui| {
        ui.set_height(height.max(120.0));

        let left_margin = 45.0;

        let response = ui.allocate_rect(
            egui::Rect::from_min_size(
                ui.min_rect().min,
                egui::vec2(ui.available_width(), ui.available_height()),
            ),
            egui::Sense::hover(),
        );

        let painter = ui.painter();
        let rect = response.rect;
        let graph_rect = egui::Rect::from_min_max(
            egui::pos2(rect.left() + left_margin, rect.top()),
            rect.right_bottom(),
        );

        painter.rect_filled(rect, 5.0, egui::Color32::from_rgb(20, 20, 30));

        if let Some(texture) = texture {
            painter.image(
                texture.id(),
                graph_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        let bands = engine.band_count();
        if bands == 0 {
            return;
        }
        let (Some(lowest), Some(highest)) =
            (engine.band_center_hz(0), engine.band_center_hz(bands - 1))
        else {
            return;
        };

        // Rows are equal height, so the axis is log-spaced between band centers.
        let row_height = graph_rect.height() / bands as f32;
        let log_min = lowest.log10();
        let log_max = highest.log10().max(log_min + f32::EPSILON);
        let grid_color = egui::Color32::from_rgba_premultiplied(100, 100, 100, 100);

        for (freq, label) in LABEL_FREQUENCIES {
            if freq < lowest || freq > highest {
                continue;
            }
            let t = (freq.log10() - log_min) / (log_max - log_min);
            let y = graph_rect.bottom()
                - row_height * 0.5
                - t * (graph_rect.height() - row_height);

            painter.line_segment(
                [egui::pos2(graph_rect.left(), y), egui::pos2(graph_rect.right(), y)],
                egui::Stroke::new(1.0, grid_color),
            );
            painter.text(
                egui::pos2(rect.left() + 5.0, y),
                egui::Align2::LEFT_CENTER,
                label,
                egui::FontId::proportional(9.0),
                egui::Color32::from_rgb(180, 180, 180),
            );
        }
    });
}

/// Per-band width proxy of the latest hop as a bar strip.
pub fn draw_width_meter(ui: &mut egui::Ui, engine: &StereoFieldEngine) {
    let widths = engine.width_per_band_post();

    ui.group(|ui| {
        ui.set_height(50.0);
        let response = ui.allocate_rect(
            egui::Rect::from_min_size(
                ui.min_rect().min,
                egui::vec2(ui.available_width(), ui.available_height()),
            ),
            egui::Sense::hover(),
        );
        let painter = ui.painter();
        let rect = response.rect;
        painter.rect_filled(rect, 5.0, egui::Color32::from_rgb(20, 20, 30));

        if widths.is_empty() {
            return;
        }

        let bar_width = rect.width() / widths.len() as f32;
        let base_color = egui::Color32::from_rgb(30, 70, 140);
        for (i, &width) in widths.iter().enumerate() {
            let color = engine.color_map().color_for((1.0 - width).clamp(-1.0, 1.0));
            let bar_height = (width / 2.0) * rect.height();
            let x = rect.left() + i as f32 * bar_width;
            painter.rect_filled(
                egui::Rect::from_min_max(
                    egui::pos2(x, rect.bottom() - bar_height),
                    egui::pos2(x + bar_width - 1.0, rect.bottom()),
                ),
                0.0,
                if width > 0.0 { color } else { base_color },
            );
        }
    });
}
