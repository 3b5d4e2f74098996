// Admin tab: review queue, statistics, certificate register and audit log
use eframe::egui;

use super::detail::status_color;
use crate::catalog::Decision;
use crate::state::{AppState, InputIntent};

fn stat(ui: &mut egui::Ui, label: &str, value: String) {
    ui.vertical(|ui| {
        ui.label(egui::RichText::new(label).small().weak());
        ui.label(egui::RichText::new(value).heading().strong());
    });
}

fn review_queue(ui: &mut egui::Ui, state: &AppState, note: &mut String, intents: &mut Vec<InputIntent>) {
    ui.heading("Hồ sơ chờ duyệt");
    let queue = state.review_queue();
    if queue.is_empty() {
        ui.label(egui::RichText::new("Không có hồ sơ nào trong khu vực phụ trách.").weak());
        return;
    }
    for p in &queue {
        let selected = state.review_selection.as_deref() == Some(p.id.as_str());
        ui.horizontal(|ui| {
            if ui.selectable_label(selected, format!("{} · {}", p.name, p.region_code)).clicked() {
                intents.push(InputIntent::SelectForReview(p.id.clone()));
            }
            ui.colored_label(status_color(p.status), p.status.label());
        });
    }

    let Some(target) = state.review_target() else {
        return;
    };
    ui.add_space(6.0);
    ui.group(|ui| {
        ui.label(egui::RichText::new(&target.name).strong());
        ui.label(format!("{} · {}", target.farmer_name, target.location.address));
        for c in &target.certificates {
            let expired = if c.is_expired(state.today) { " (đã hết hạn)" } else { "" };
            ui.label(format!("{} · {} · hết hạn {}{}", c.cert_type.label(), c.proof, c.expiry_date, expired));
        }
        ui.add(egui::TextEdit::multiline(note).hint_text("Ghi chú / lý do").desired_rows(2));
        ui.horizontal(|ui| {
            if ui.button("✔ Duyệt").clicked() {
                intents.push(InputIntent::Review(Decision::Approve { note: note.trim().to_string() }));
            }
            if ui.add_enabled(!note.trim().is_empty(), egui::Button::new("✖ Từ chối")).clicked() {
                intents.push(InputIntent::Review(Decision::Reject { reason: note.trim().to_string() }));
            }
        });
    });
}

pub fn show(ui: &mut egui::Ui, state: &AppState, note: &mut String, intents: &mut Vec<InputIntent>) {
    let stats = state.catalog.stats();
    ui.horizontal(|ui| {
        stat(ui, "Vùng trồng", stats.total_products.to_string());
        ui.separator();
        stat(ui, "Diện tích", format!("{:.1} ha", stats.total_area));
        ui.separator();
        stat(ui, "Đã duyệt", stats.approved.to_string());
        ui.separator();
        stat(ui, "Chờ duyệt", stats.pending.to_string());
        ui.separator();
        stat(ui, "Sản lượng", format!("{:.0} tấn", stats.total_yield));
        ui.separator();
        stat(ui, "Chứng nhận", stats.total_certificates.to_string());
    });
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        review_queue(ui, state, note, intents);
        ui.add_space(12.0);

        ui.heading("Theo danh mục");
        egui::Grid::new("category_breakdown").num_columns(3).striped(true).show(ui, |ui| {
            for share in state.catalog.category_breakdown() {
                ui.label(&share.category);
                ui.label(share.count.to_string());
                ui.label(format!("{:.1} ha", share.area));
                ui.end_row();
            }
        });
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            ui.heading("Sổ chứng nhận");
            if ui.button("Cập nhật hết hạn").on_hover_text("Chuyển vùng trồng có chứng nhận hết hạn sang Hết hạn").clicked() {
                intents.push(InputIntent::ExpireCertificates);
            }
        });
        egui::Grid::new("certificate_register").num_columns(4).striped(true).show(ui, |ui| {
            for row in state.catalog.certificate_register(state.today) {
                ui.label(&row.farm_name);
                ui.label(&row.region_code);
                ui.label(row.cert_type.label());
                if row.expired {
                    ui.colored_label(egui::Color32::RED, row.expiry_date.to_string());
                } else {
                    ui.label(row.expiry_date.to_string());
                }
                ui.end_row();
            }
        });
        ui.add_space(12.0);

        ui.heading("Nhật ký thẩm định");
        egui::Grid::new("audit_log").num_columns(4).striped(true).show(ui, |ui| {
            for entry in state.catalog.audit_log() {
                ui.label(entry.timestamp.strftime("%Y-%m-%d %H:%M").to_string());
                ui.label(format!("{} ({})", entry.admin_name, entry.admin_id));
                ui.label(format!("{}: {}", entry.action, entry.target_name));
                ui.label(entry.details.as_deref().unwrap_or(""));
                ui.end_row();
            }
        });
    });
}
