use eframe::egui;

use crate::map::MapEvent;
use crate::map::search::SearchInput;

/// Search field with submit/clear buttons and suggestion chips. Typing only
/// edits the local text; events are queued for the controller.
pub fn show(ui: &mut egui::Ui, search: &mut SearchInput, suggestions: &[String], events: &mut Vec<MapEvent>) {
    ui.horizontal(|ui| {
        let clear_width = if search.local().is_empty() && search.applied().is_empty() { 0.0 } else { 28.0 };
        let edit = egui::TextEdit::singleline(search.local_mut())
            .hint_text("Tìm nông sản, nông hộ, mã PUC...")
            .desired_width(ui.available_width() - 36.0 - clear_width);
        let response = ui.add(edit);

        if response.gained_focus() {
            events.push(MapEvent::FocusSearch);
        }
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            events.push(MapEvent::Submit);
        }
        if ui.button("🔍").on_hover_text("Tìm").clicked() {
            events.push(MapEvent::Submit);
        }
        if clear_width > 0.0 && ui.button("✕").on_hover_text("Xóa").clicked() {
            events.push(MapEvent::ClearSearch);
        }
    });

    if search.suggestions_visible() && !suggestions.is_empty() {
        ui.add_space(4.0);
        ui.label(egui::RichText::new("Gợi ý").small().weak());
        ui.horizontal_wrapped(|ui| {
            for s in suggestions {
                if ui.button(s.as_str()).clicked() {
                    events.push(MapEvent::Suggestion(s.clone()));
                }
            }
        });
    }
}
