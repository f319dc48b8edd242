use eframe::egui;

use crate::common::ChatMessage;
use crate::ui::state::ScrollState;

/// Room left under the log for the input bar.
const INPUT_BAR_RESERVE: f32 = 36.0;

pub fn render(ui: &mut egui::Ui, messages: &[ChatMessage], scroll: &mut ScrollState) {
    let jump = scroll.take_jump();
    let max_height = (ui.available_height() - INPUT_BAR_RESERVE).max(0.0);

    let output = egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height(max_height)
        .show(ui, |ui| {
            for message in messages {
                ui.horizontal_wrapped(|ui| {
                    // Labels render text verbatim, markup in content is never interpreted
                    ui.label(egui::RichText::new(format!("{}:", message.nickname)).strong());
                    ui.label(message.content.as_str());
                });
            }

            if jump {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    scroll.update_from_view(
        output.state.offset.y,
        output.content_size.y,
        output.inner_rect.height(),
    );
}
