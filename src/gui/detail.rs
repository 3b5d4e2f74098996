use eframe::egui;
use jiff::civil::Date;

use crate::config::HomeConfig;
use crate::model::{Product, ProductStatus};
use crate::position::get_distance_bearing_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Close,
    ToggleSaved,
    Directions,
    Call,
}

pub fn status_color(status: ProductStatus) -> egui::Color32 {
    match status {
        ProductStatus::Approved => egui::Color32::from_rgb(22, 163, 74),
        ProductStatus::Pending | ProductStatus::RePending => egui::Color32::from_rgb(217, 119, 6),
        ProductStatus::Rejected => egui::Color32::from_rgb(220, 38, 38),
        ProductStatus::Expired => egui::Color32::GRAY,
    }
}

/// Detail card for the selected product
pub fn show(
    ui: &mut egui::Ui,
    product: &Product,
    saved: bool,
    home: Option<&HomeConfig>,
    today: Date,
) -> Option<DetailAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.heading(&product.name);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("✕").on_hover_text("Đóng").clicked() {
                action = Some(DetailAction::Close);
            }
            let star = if saved { "★" } else { "☆" };
            if ui.button(star).on_hover_text("Lưu").clicked() {
                action = Some(DetailAction::ToggleSaved);
            }
        });
    });
    ui.colored_label(status_color(product.status), product.status.label());
    // Remote images go through the egui_extras http loader
    if let Some(url) = product.images.orchard.first().or(product.images.product.first()) {
        ui.add(egui::Image::new(url.as_str()).max_height(160.0));
    }
    ui.separator();

    egui::Grid::new("detail_grid").num_columns(2).striped(true).show(ui, |ui| {
        let mut row = |label: &str, value: String| {
            ui.label(egui::RichText::new(label).weak());
            ui.label(value);
            ui.end_row();
        };
        row("Mã PUC", product.region_code.clone());
        row("Địa chỉ", product.location.address.clone());
        row("Nông hộ", product.farmer_name.clone());
        row("Danh mục", product.category.clone());
        if !product.variety.is_empty() {
            row("Giống", product.variety.clone());
        }
        row("Diện tích", format!("{:.1} ha", product.area));
        row("Sản lượng", format!("{:.0} tấn/năm", product.expected_yield));
        row("Tháng thu hoạch", product.harvest_months_label());
        if product.rating > 0.0 {
            row("Đánh giá", format!("{:.1} / 5", product.rating));
        }
        if let Some(home) = home
            && let Some(s) = get_distance_bearing_string(
                (home.lat, home.lng),
                (product.location.lat, product.location.lng),
            )
        {
            let from = if home.name.is_empty() { "Khoảng cách" } else { home.name.as_str() };
            row(from, s);
        }
    });

    if !product.certificates.is_empty() {
        ui.add_space(6.0);
        ui.label(egui::RichText::new("Chứng nhận").strong());
        for c in &product.certificates {
            let text = format!("{} · hết hạn {}", c.cert_type.label(), c.expiry_date);
            if c.is_expired(today) {
                ui.colored_label(egui::Color32::RED, format!("{} (đã hết hạn)", text));
            } else {
                ui.label(text);
            }
        }
    }

    if !product.description.is_empty() {
        ui.add_space(6.0);
        ui.label(&product.description);
    }

    if !product.timeline.is_empty() {
        ui.add_space(6.0);
        ui.label(egui::RichText::new("Nhật ký canh tác").strong());
        for entry in &product.timeline {
            ui.label(format!("{} · {}: {}", entry.date, entry.stage, entry.description));
        }
    }

    if let Some(note) = &product.verification_note {
        ui.add_space(6.0);
        let by = product.verified_by.as_deref().unwrap_or("");
        ui.label(egui::RichText::new(format!("Ghi chú thẩm định ({}): {}", by, note)).italics());
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui.button("🧭 Chỉ đường").clicked() {
            action = Some(DetailAction::Directions);
        }
        if ui.add_enabled(!product.contact.trim().is_empty(), egui::Button::new("📞 Gọi")).clicked() {
            action = Some(DetailAction::Call);
        }
    });

    action
}
