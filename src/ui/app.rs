use eframe::egui;

use crate::network::ChatConnection;

use super::components::{chat_area, input_bar, status_panel};
use super::widget::ChatWidget;

pub struct ChatApp {
    widget: ChatWidget,
    title: String,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        connection: ChatConnection,
        title: String,
    ) -> Self {
        let mut widget = ChatWidget::new(connection);
        widget.mount();
        Self { widget, title }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.widget.pump();

        egui::SidePanel::right("status_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                status_panel::render(ui, self.widget.state());
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.title.as_str());
            ui.separator();

            let state = self.widget.state_mut();
            chat_area::render(ui, &state.messages, &mut state.scroll);

            ui.separator();
            if input_bar::render(ui, &mut state.input_text) {
                self.widget.send();
            }
        });

        ctx.request_repaint();
    }
}
