// Domain types for registered production regions (PUC) and the people who look at them.
use geo::Point;
use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ProductId = String;

pub const CATEGORIES: [&str; 7] =
    ["Trái cây", "Lúa gạo", "Rau củ", "Thủy sản", "Gia súc", "Gia cầm", "Cà phê/Hồ tiêu"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
    RePending,
    Expired,
}

impl ProductStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "Chờ duyệt",
            ProductStatus::Approved => "Đã duyệt",
            ProductStatus::Rejected => "Từ chối",
            ProductStatus::RePending => "Chờ duyệt lại",
            ProductStatus::Expired => "Hết hạn",
        }
    }

    /// Waiting in the review queue
    pub fn awaiting_review(&self) -> bool {
        matches!(self, ProductStatus::Pending | ProductStatus::RePending)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertType {
    VietGap,
    GlobalGap,
    Ocop,
    Organic,
}

impl CertType {
    pub fn label(&self) -> &'static str {
        match self {
            CertType::VietGap => "VietGAP",
            CertType::GlobalGap => "GlobalGAP",
            CertType::Ocop => "OCOP",
            CertType::Organic => "Hữu cơ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub cert_type: CertType,
    /// Reference to the uploaded proof document
    pub proof: String,
    pub issue_date: Date,
    pub expiry_date: Date,
}

impl Certificate {
    pub fn is_expired(&self, today: Date) -> bool {
        self.expiry_date < today
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl FarmLocation {
    /// geo convention: x = longitude, y = latitude
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImages {
    pub orchard: Vec<String>,
    pub product: Vec<String>,
    pub warehouse: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: String,
    pub date: Date,
    pub stage: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub farmer_id: String,
    pub farmer_name: String,
    pub name: String,
    #[serde(default)]
    pub variety: String,
    pub category: String,
    /// Hectares
    #[serde(default)]
    pub area: f64,
    /// Tonnes per season
    #[serde(default)]
    pub expected_yield: f64,
    #[serde(default)]
    pub description: String,
    pub harvest_months: Vec<u8>,
    #[serde(default)]
    pub images: ProductImages,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    pub region_code: String,
    pub location: FarmLocation,
    pub status: ProductStatus,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub verified_at: Option<Timestamp>,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verification_note: Option<String>,
}

impl Product {
    pub fn point(&self) -> Point<f64> {
        self.location.point()
    }

    pub fn harvest_months_label(&self) -> String {
        self.harvest_months.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    Commune,
    District,
    Province,
    Central,
}

impl AdminLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AdminLevel::Commune => "Cấp Xã/Phường",
            AdminLevel::District => "Cấp Quận/Huyện",
            AdminLevel::Province => "Cấp Tỉnh/Thành phố",
            AdminLevel::Central => "Cấp Trung ương",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    Farmer { farmer_id: String },
    Buyer,
    Admin { admin_id: String, level: AdminLevel, assigned_area: String },
}

/// Whoever is looking at the catalog right now.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub name: String,
    pub role: Role,
}

impl Viewer {
    pub fn buyer() -> Self {
        Self { name: String::new(), role: Role::Buyer }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin { .. })
    }

    /// Lowercased last word of the assigned area. `None` for non-admins and
    /// for central-level admins, who are not restricted by area.
    pub fn area_token(&self) -> Option<String> {
        match &self.role {
            Role::Admin { level: AdminLevel::Central, .. } => None,
            Role::Admin { assigned_area, .. } => Some(
                assigned_area.split_whitespace().last().unwrap_or("").to_lowercase(),
            ),
            _ => None,
        }
    }
}

/// Category constraint with an explicit "all" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn from_arg(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") || s == "Tất cả" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(s.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "Tất cả",
            CategoryFilter::Only(c) => c,
        }
    }
}
