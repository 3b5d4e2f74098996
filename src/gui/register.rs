// Farmer tab: own registrations and the registration form
use anyhow::{Context, Result};
use eframe::egui;
use jiff::civil::Date;

use super::detail::status_color;
use crate::catalog::{CertificateUpload, Registration};
use crate::model::{CATEGORIES, CertType, Product, ProductStatus};
use crate::state::InputIntent;

const CERT_TYPES: [CertType; 4] = [CertType::VietGap, CertType::GlobalGap, CertType::Ocop, CertType::Organic];

/// Raw text of the form; parsed only on submit
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub variety: String,
    pub category: String,
    pub area: String,
    pub expected_yield: String,
    pub months: [bool; 12],
    pub region_code: String,
    pub address: String,
    pub lat: String,
    pub lng: String,
    pub contact: String,
    pub description: String,
    pub cert_type: Option<CertType>,
    pub cert_proof: String,
    pub cert_expiry: String,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            variety: String::new(),
            category: CATEGORIES[0].to_string(),
            area: String::new(),
            expected_yield: String::new(),
            months: [false; 12],
            region_code: String::new(),
            address: String::new(),
            lat: String::new(),
            lng: String::new(),
            contact: String::new(),
            description: String::new(),
            cert_type: None,
            cert_proof: String::new(),
            cert_expiry: String::new(),
        }
    }
}

fn parse_number(text: &str, what: &str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.replace(',', ".").parse::<f64>().with_context(|| format!("{} is not a number: {:?}", what, text))
}

impl RegisterForm {
    pub fn to_registration(&self) -> Result<Registration> {
        let coordinates = match (self.lat.trim(), self.lng.trim()) {
            ("", "") => None,
            (lat, lng) => Some((parse_number(lat, "latitude")?, parse_number(lng, "longitude")?)),
        };
        let certificates = match self.cert_type {
            Some(cert_type) => {
                let expiry_date: Date = self
                    .cert_expiry
                    .trim()
                    .parse()
                    .with_context(|| format!("certificate expiry must be YYYY-MM-DD: {:?}", self.cert_expiry))?;
                vec![CertificateUpload { cert_type, proof: self.cert_proof.trim().to_string(), expiry_date }]
            }
            None => Vec::new(),
        };
        let registration = Registration {
            name: self.name.trim().to_string(),
            variety: self.variety.trim().to_string(),
            category: self.category.clone(),
            area: parse_number(&self.area, "area")?,
            expected_yield: parse_number(&self.expected_yield, "expected yield")?,
            description: self.description.trim().to_string(),
            harvest_months: (1..=12u8).filter(|m| self.months[usize::from(*m) - 1]).collect(),
            certificates,
            region_code: self.region_code.trim().to_string(),
            address: self.address.trim().to_string(),
            coordinates,
            contact: self.contact.trim().to_string(),
            ..Default::default()
        };
        registration.validate()?;
        Ok(registration)
    }
}

fn my_products_table(ui: &mut egui::Ui, products: &[&Product], intents: &mut Vec<InputIntent>) {
    if products.is_empty() {
        ui.label(egui::RichText::new("Chưa có vùng trồng nào.").weak());
        return;
    }
    egui::Grid::new("my_products").num_columns(4).striped(true).show(ui, |ui| {
        for p in products {
            ui.label(&p.name);
            ui.label(&p.region_code);
            ui.colored_label(status_color(p.status), p.status.label());
            if matches!(p.status, ProductStatus::Rejected | ProductStatus::Expired) {
                if ui.button("Gửi lại").clicked() {
                    intents.push(InputIntent::Resubmit(p.id.clone()));
                }
            } else {
                ui.label("");
            }
            ui.end_row();
        }
    });
}

pub fn show(
    ui: &mut egui::Ui,
    form: &mut RegisterForm,
    my_products: &[&Product],
    intents: &mut Vec<InputIntent>,
    error: &mut Option<String>,
) {
    ui.heading("Vùng trồng của tôi");
    my_products_table(ui, my_products, intents);
    ui.add_space(12.0);
    ui.separator();
    ui.heading("Đăng ký vùng trồng mới");

    egui::Grid::new("register_form").num_columns(2).show(ui, |ui| {
        ui.label("Tên nông sản *");
        ui.text_edit_singleline(&mut form.name);
        ui.end_row();

        ui.label("Giống");
        ui.text_edit_singleline(&mut form.variety);
        ui.end_row();

        ui.label("Danh mục");
        egui::ComboBox::from_id_salt("register_category")
            .selected_text(form.category.as_str())
            .show_ui(ui, |ui| {
                for c in CATEGORIES {
                    ui.selectable_value(&mut form.category, c.to_string(), c);
                }
            });
        ui.end_row();

        ui.label("Diện tích (ha)");
        ui.text_edit_singleline(&mut form.area);
        ui.end_row();

        ui.label("Sản lượng (tấn/năm)");
        ui.text_edit_singleline(&mut form.expected_yield);
        ui.end_row();

        ui.label("Tháng thu hoạch *");
        ui.horizontal_wrapped(|ui| {
            for (i, on) in form.months.iter_mut().enumerate() {
                ui.toggle_value(on, format!("T{}", i + 1));
            }
        });
        ui.end_row();

        ui.label("Mã PUC *");
        ui.text_edit_singleline(&mut form.region_code);
        ui.end_row();

        ui.label("Địa chỉ");
        ui.text_edit_singleline(&mut form.address);
        ui.end_row();

        ui.label("Vĩ độ / Kinh độ");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut form.lat).desired_width(90.0));
            ui.add(egui::TextEdit::singleline(&mut form.lng).desired_width(90.0));
        });
        ui.end_row();

        ui.label("Liên hệ");
        ui.text_edit_singleline(&mut form.contact);
        ui.end_row();

        ui.label("Mô tả");
        ui.text_edit_multiline(&mut form.description);
        ui.end_row();

        ui.label("Chứng nhận");
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("register_cert")
                .selected_text(form.cert_type.map(|c| c.label()).unwrap_or("Không"))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut form.cert_type, None, "Không");
                    for c in CERT_TYPES {
                        ui.selectable_value(&mut form.cert_type, Some(c), c.label());
                    }
                });
            if form.cert_type.is_some() {
                ui.add(egui::TextEdit::singleline(&mut form.cert_proof).hint_text("Tệp minh chứng").desired_width(120.0));
                ui.add(egui::TextEdit::singleline(&mut form.cert_expiry).hint_text("YYYY-MM-DD").desired_width(90.0));
            }
        });
        ui.end_row();
    });

    if let Some(msg) = error.as_ref() {
        ui.colored_label(egui::Color32::RED, msg);
    }
    if ui.button("Gửi hồ sơ").clicked() {
        match form.to_registration() {
            Ok(registration) => {
                intents.push(InputIntent::Register(registration));
                *form = RegisterForm::default();
                *error = None;
            }
            Err(e) => *error = Some(format!("{:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn filled() -> RegisterForm {
        let mut form = RegisterForm {
            name: " Bưởi Năm Roi ".to_string(),
            region_code: "VN-VLG-PUC-099".to_string(),
            area: "3,5".to_string(),
            lat: "10.1".to_string(),
            lng: "105.9".to_string(),
            ..Default::default()
        };
        form.months[8] = true;
        form.months[9] = true;
        form
    }

    #[test]
    fn test_form_to_registration() {
        let reg = filled().to_registration().unwrap();
        assert_eq!(reg.name, "Bưởi Năm Roi");
        assert_eq!(reg.harvest_months, vec![9, 10]);
        assert_eq!(reg.area, 3.5);
        assert_eq!(reg.coordinates, Some((10.1, 105.9)));
        assert_eq!(reg.category, CATEGORIES[0]);
        assert!(reg.certificates.is_empty());
    }

    #[test]
    fn test_form_certificate_needs_date() {
        let mut form = filled();
        form.cert_type = Some(CertType::VietGap);
        form.cert_expiry = "31/12/2026".to_string();
        assert!(form.to_registration().is_err());

        form.cert_expiry = "2026-12-31".to_string();
        let reg = form.to_registration().unwrap();
        assert_eq!(reg.certificates[0].expiry_date, date(2026, 12, 31));
    }

    #[test]
    fn test_form_requires_months_and_numbers() {
        let mut form = filled();
        form.months = [false; 12];
        assert!(form.to_registration().is_err());

        let mut form = filled();
        form.area = "ba ha".to_string();
        assert!(form.to_registration().is_err());
    }
}
