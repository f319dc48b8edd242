use eframe::egui;

use crate::ui::state::{AppState, ConnectionStatus};

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Connection");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Status:");
        match &state.status {
            ConnectionStatus::Connecting => {
                ui.colored_label(egui::Color32::YELLOW, "connecting...");
            }
            ConnectionStatus::Connected { sid } => {
                ui.colored_label(egui::Color32::GREEN, "● connected");
                ui.label(egui::RichText::new(sid.as_str()).weak());
            }
            ConnectionStatus::Disconnected { .. } => {
                ui.colored_label(egui::Color32::RED, "○ disconnected");
            }
        }
    });

    // Lý do mất kết nối, không có reconnect tự động
    if let ConnectionStatus::Disconnected { reason } = &state.status {
        ui.label(egui::RichText::new(reason.as_str()).weak());
    }

    ui.horizontal(|ui| {
        ui.label("Messages:");
        ui.label(format!("{}", state.messages.len()));
    });

    ui.separator();

    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(200.0)
        .show(ui, |ui| {
            for event in state.status_events.iter().rev().take(20) {
                let time_str = event.timestamp.format("%H:%M:%S");
                let color = match event.event_type.as_str() {
                    "CONNECTED" => egui::Color32::GREEN,
                    "DISCONNECTED" | "SEND_FAILED" | "SUBSCRIBE_FAILED" => egui::Color32::RED,
                    "PROTOCOL_ERROR" => egui::Color32::YELLOW,
                    _ => egui::Color32::WHITE,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{}]", time_str));
                    ui.label(&event.message);
                });
            }
        });
}
