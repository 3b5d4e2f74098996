// In-memory product catalog: seed data, registration, review and dashboard aggregates.
use anyhow::{Context, Result, bail, ensure};
use jiff::Timestamp;
use jiff::civil::{Date, date};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::model::{
    CertType, Certificate, FarmLocation, Product, ProductId, ProductImages, ProductStatus, Role,
    TimelineEntry, Viewer,
};

const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const PLACEHOLDER_IMAGE: &str = "https://picsum.photos/600/400";
/// Used when the submission carries no coordinates
const DEFAULT_REGISTRATION_POINT: (f64, f64) = (10.2, 105.8);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: Timestamp,
    pub admin_name: String,
    pub admin_id: String,
    pub action: String,
    pub target_id: ProductId,
    pub target_name: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// The admin performing a review.
#[derive(Debug, Clone, PartialEq)]
pub struct Reviewer {
    pub name: String,
    pub admin_id: String,
}

impl Reviewer {
    pub fn from_viewer(viewer: &Viewer) -> Option<Self> {
        match &viewer.role {
            Role::Admin { admin_id, .. } => {
                Some(Self { name: viewer.name.clone(), admin_id: admin_id.clone() })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve { note: String },
    Reject { reason: String },
}

#[derive(Debug, Clone)]
pub struct CertificateUpload {
    pub cert_type: CertType,
    pub proof: String,
    pub expiry_date: Date,
}

/// A farmer's registration submission.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub farmer_id: String,
    pub farmer_name: String,
    pub name: String,
    pub variety: String,
    pub category: String,
    pub area: f64,
    pub expected_yield: f64,
    pub description: String,
    pub harvest_months: Vec<u8>,
    pub certificates: Vec<CertificateUpload>,
    pub region_code: String,
    pub address: String,
    /// (lat, lng)
    pub coordinates: Option<(f64, f64)>,
    pub contact: String,
    pub images: ProductImages,
}

impl Registration {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.trim().is_empty(), "product name is required");
        ensure!(!self.region_code.trim().is_empty(), "region code (PUC) is required");
        ensure!(!self.harvest_months.is_empty(), "at least one harvest month is required");
        if let Some(m) = self.harvest_months.iter().find(|m| !(1..=12).contains(*m)) {
            bail!("invalid harvest month {}", m);
        }
        if let Some((lat, lng)) = self.coordinates {
            ensure!(
                (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng),
                "coordinates out of bounds: {}, {}",
                lat,
                lng
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStats {
    pub total_products: usize,
    pub total_area: f64,
    pub approved: usize,
    pub pending: usize,
    pub total_yield: f64,
    pub total_certificates: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub area: f64,
}

#[derive(Debug, Clone)]
pub struct CertificateRow {
    pub farm_name: String,
    pub region_code: String,
    pub cert_type: CertType,
    pub proof: String,
    pub expiry_date: Date,
    pub expired: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
    #[serde(default)]
    audit: Vec<AuditEntry>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products, audit: Vec::new() }
    }

    /// JSON snapshot: either a bare product array or `{ "products": [...], "audit": [...] }`.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        // Parse only the shape the document starts with so its error is the one reported
        let catalog = match content.trim_start().as_bytes().first() {
            Some(b'[') => Self::new(
                serde_json::from_str::<Vec<Product>>(&content)
                    .with_context(|| format!("parsing product list {}", path.display()))?,
            ),
            _ => serde_json::from_str::<Catalog>(&content)
                .with_context(|| format!("parsing catalog {}", path.display()))?,
        };
        debug!("Loaded {} products from {}", catalog.products.len(), path.display());
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Product> {
        match self.products.iter_mut().find(|p| p.id == id) {
            Some(p) => Ok(p),
            None => bail!("no product with id {}", id),
        }
    }

    /// Newest first
    pub fn audit_log(&self) -> impl Iterator<Item = &AuditEntry> {
        self.audit.iter().rev()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.status.awaiting_review())
    }

    pub fn owned_by<'a>(&'a self, farmer_id: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| p.farmer_id == farmer_id)
    }

    pub fn register(&mut self, reg: Registration, today: Date) -> Result<ProductId> {
        reg.validate()?;
        let id = self.fresh_id();
        let (lat, lng) = reg.coordinates.unwrap_or(DEFAULT_REGISTRATION_POINT);
        let or_placeholder = |mut v: Vec<String>| {
            if v.is_empty() {
                v.push(PLACEHOLDER_IMAGE.to_string());
            }
            v
        };
        let product = Product {
            id: id.clone(),
            farmer_id: reg.farmer_id,
            farmer_name: reg.farmer_name,
            name: reg.name.trim().to_string(),
            variety: reg.variety,
            category: reg.category,
            area: reg.area,
            expected_yield: reg.expected_yield,
            description: reg.description,
            harvest_months: reg.harvest_months,
            images: ProductImages {
                orchard: or_placeholder(reg.images.orchard),
                product: or_placeholder(reg.images.product),
                warehouse: or_placeholder(reg.images.warehouse),
            },
            certificates: reg
                .certificates
                .into_iter()
                .map(|c| Certificate {
                    cert_type: c.cert_type,
                    proof: c.proof,
                    issue_date: today,
                    expiry_date: c.expiry_date,
                })
                .collect(),
            region_code: reg.region_code.trim().to_string(),
            location: FarmLocation { lat, lng, address: reg.address },
            status: ProductStatus::Pending,
            contact: reg.contact,
            rating: 0.0,
            timeline: Vec::new(),
            updated_at: Timestamp::now(),
            verified_at: None,
            verified_by: None,
            verification_note: None,
        };
        info!("Registered {} ({}) as {}", product.name, product.region_code, id);
        self.products.insert(0, product);
        Ok(id)
    }

    pub fn review(&mut self, id: &str, decision: Decision, reviewer: &Reviewer) -> Result<()> {
        let audit_id = format!("l{}", self.audit.len() + 1);
        let product = self.get_mut(id)?;
        ensure!(
            product.status.awaiting_review(),
            "{} is {} and cannot be reviewed",
            product.name,
            product.status
        );
        let (status, note, action) = match decision {
            Decision::Approve { note } => (ProductStatus::Approved, note, "Duyệt hồ sơ"),
            Decision::Reject { reason } => (ProductStatus::Rejected, reason, "Từ chối"),
        };
        let now = Timestamp::now();
        product.status = status;
        product.verification_note = Some(note.clone()).filter(|n| !n.trim().is_empty());
        product.verified_at = Some(now);
        product.verified_by = Some(reviewer.name.clone());
        info!("{} {} -> {}", reviewer.admin_id, product.name, status);

        let entry = AuditEntry {
            id: audit_id,
            timestamp: now,
            admin_name: reviewer.name.clone(),
            admin_id: reviewer.admin_id.clone(),
            action: action.to_string(),
            target_id: product.id.clone(),
            target_name: product.name.clone(),
            details: Some(note).filter(|n| !n.trim().is_empty()),
        };
        self.audit.push(entry);
        Ok(())
    }

    /// Send a rejected or expired registration back to the review queue.
    pub fn resubmit(&mut self, id: &str) -> Result<()> {
        let product = self.get_mut(id)?;
        ensure!(
            matches!(product.status, ProductStatus::Rejected | ProductStatus::Expired),
            "{} is {} and cannot be resubmitted",
            product.name,
            product.status
        );
        product.status = ProductStatus::RePending;
        product.updated_at = Timestamp::now();
        info!("Resubmitted {}", product.name);
        Ok(())
    }

    /// Approved products whose certificates have all expired become Expired.
    pub fn expire_certificates(&mut self, today: Date) -> usize {
        let mut count = 0;
        for p in self.products.iter_mut().filter(|p| p.status == ProductStatus::Approved) {
            if !p.certificates.is_empty() && p.certificates.iter().all(|c| c.is_expired(today)) {
                p.status = ProductStatus::Expired;
                count += 1;
            }
        }
        if count > 0 {
            info!("{} products expired on {}", count, today);
        }
        count
    }

    pub fn stats(&self) -> CatalogStats {
        let products = &self.products;
        CatalogStats {
            total_products: products.len(),
            total_area: products.iter().map(|p| p.area).sum(),
            approved: products.iter().filter(|p| p.status == ProductStatus::Approved).count(),
            pending: products.iter().filter(|p| p.status == ProductStatus::Pending).count(),
            total_yield: products.iter().map(|p| p.expected_yield).sum(),
            total_certificates: products.iter().map(|p| p.certificates.len()).sum(),
        }
    }

    /// Per-category count and area, in order of first appearance.
    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        let mut shares: Vec<CategoryShare> = Vec::new();
        for p in &self.products {
            match shares.iter_mut().find(|s| s.category == p.category) {
                Some(s) => {
                    s.count += 1;
                    s.area += p.area;
                }
                None => shares.push(CategoryShare {
                    category: p.category.clone(),
                    count: 1,
                    area: p.area,
                }),
            }
        }
        shares
    }

    pub fn certificate_register(&self, today: Date) -> Vec<CertificateRow> {
        self.products
            .iter()
            .flat_map(|p| {
                p.certificates.iter().map(move |c| CertificateRow {
                    farm_name: p.farmer_name.clone(),
                    region_code: p.region_code.clone(),
                    cert_type: c.cert_type,
                    proof: c.proof.clone(),
                    expiry_date: c.expiry_date,
                    expired: c.is_expired(today),
                })
            })
            .collect()
    }

    fn fresh_id(&self) -> ProductId {
        let mut rng = rand::rng();
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
                .collect();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Built-in demo dataset of Mekong-delta production regions.
    pub fn seeded() -> Self {
        let products = vec![
            seed(
                "1", "f1", "HTX Bến Tre Công Nghệ Cao", "Bưởi Da Xanh Bến Tre", "Da Xanh Ruột Hồng",
                "Trái cây", 12.5, 50.0, &[8, 9, 10, 11, 12], "VN-BTE-PUC-001",
                (10.2435, 106.3756, "Châu Thành, Bến Tre"), ProductStatus::Approved,
                "0901234567", 4.8, 1698192000,
            )
            .with_description("Sản xuất theo tiêu chuẩn hữu cơ, không sử dụng thuốc trừ sâu hóa học.")
            .with_cert(CertType::VietGap, "pdf1", date(2023, 5, 10), date(2025, 5, 10))
            .with_timeline("t1", date(2023, 10, 1), "Đang đậu quả", "Cây phát triển tốt, đã bọc quả tránh ruồi vàng."),
            seed(
                "2", "f2", "Trang trại Ri6 Long Hồ", "Sầu riêng Ri6 Vĩnh Long", "Ri6",
                "Trái cây", 8.0, 30.0, &[5, 6, 7], "VN-VLG-PUC-014",
                (10.2397, 105.9572, "Long Hồ, Vĩnh Long"), ProductStatus::Pending,
                "0912345678", 0.0, 1710929745,
            )
            .with_description("Vườn sầu riêng 10 năm tuổi, tưới nhỏ giọt.")
            .with_cert(CertType::GlobalGap, "pdf2", date(2022, 3, 1), date(2024, 3, 1)),
            seed(
                "3", "f3", "HTX Xoài Hòa Lộc", "Xoài Cát Hòa Lộc", "Cát Hòa Lộc",
                "Trái cây", 20.0, 80.0, &[3, 4, 5], "VN-TGG-PUC-007",
                (10.3560, 106.1180, "Cái Bè, Tiền Giang"), ProductStatus::Approved,
                "0933456789", 4.6, 1705017600,
            )
            .with_description("Xoài đặc sản, chỉ dẫn địa lý Hòa Lộc.")
            .with_cert(CertType::VietGap, "pdf3", date(2023, 1, 15), date(2026, 1, 15))
            .with_cert(CertType::Ocop, "pdf4", date(2023, 6, 1), date(2026, 6, 1)),
            seed(
                "4", "f4", "HTX Lúa Sóc Trăng", "Lúa ST25", "ST25",
                "Lúa gạo", 150.0, 900.0, &[2, 3, 9, 10], "VN-STG-PUC-021",
                (9.5600, 105.9900, "Mỹ Xuyên, Sóc Trăng"), ProductStatus::Approved,
                "0944567890", 4.9, 1706832000,
            )
            .with_description("Gạo ngon nhất thế giới, canh tác lúa - tôm.")
            .with_cert(CertType::Organic, "pdf5", date(2023, 2, 1), date(2026, 2, 1)),
            seed(
                "5", "f5", "Vườn Vú Sữa Lò Rèn Vĩnh Kim", "Vú sữa Lò Rèn", "Lò Rèn",
                "Trái cây", 5.5, 22.0, &[1, 2, 3], "VN-TGG-PUC-031",
                (10.3800, 106.2300, "Châu Thành, Tiền Giang"), ProductStatus::Approved,
                "0955678901", 4.7, 1701734400,
            )
            .with_cert(CertType::VietGap, "pdf6", date(2023, 9, 1), date(2026, 9, 1)),
            seed(
                "6", "f6", "Trang trại Thanh Long Hàm Thuận", "Thanh long ruột đỏ", "Ruột đỏ",
                "Trái cây", 10.0, 60.0, &[4, 5, 6, 7, 8], "VN-BTN-PUC-003",
                (10.9300, 108.1000, "Hàm Thuận Bắc, Bình Thuận"), ProductStatus::Rejected,
                "0966789012", 0.0, 1709251200,
            ),
            seed(
                "7", "f7", "HTX Tôm Sú Năm Căn", "Tôm sú sinh thái", "Tôm sú",
                "Thủy sản", 35.0, 40.0, &[6, 7, 8, 9], "VN-CMU-PUC-011",
                (8.7600, 105.0000, "Năm Căn, Cà Mau"), ProductStatus::RePending,
                "0977890123", 0.0, 1700265600,
            )
            .with_cert(CertType::Organic, "pdf7", date(2023, 11, 1), date(2026, 11, 1)),
            seed(
                "8", "f8", "HTX Cà Phê Cư M'gar", "Cà phê Robusta", "Robusta",
                "Cà phê/Hồ tiêu", 40.0, 120.0, &[11, 12], "VN-DLK-PUC-042",
                (12.8200, 108.0800, "Cư M'gar, Đắk Lắk"), ProductStatus::Expired,
                "0988901234", 4.2, 1708387200,
            )
            .with_cert(CertType::GlobalGap, "pdf8", date(2020, 1, 1), date(2023, 1, 1)),
        ];

        let audit = vec![
            AuditEntry {
                id: "l1".to_string(),
                timestamp: Timestamp::constant(1710929745, 0),
                admin_name: "Trần Thị Kiểm Duyệt".to_string(),
                admin_id: "GOV-123".to_string(),
                action: "Từ chối".to_string(),
                target_id: "6".to_string(),
                target_name: "Thanh long ruột đỏ".to_string(),
                details: Some("Chứng chỉ GlobalGAP đã hết hạn, yêu cầu cập nhật.".to_string()),
            },
            AuditEntry {
                id: "l2".to_string(),
                timestamp: Timestamp::constant(1710945022, 0),
                admin_name: "Nguyễn Văn Quản Lý".to_string(),
                admin_id: "GOV-889".to_string(),
                action: "Duyệt hồ sơ".to_string(),
                target_id: "1".to_string(),
                target_name: "Bưởi Da Xanh Bến Tre".to_string(),
                details: Some("Hồ sơ đầy đủ, chứng chỉ VietGAP còn hiệu lực.".to_string()),
            },
        ];

        Self { products, audit }
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    farmer_id: &str,
    farmer_name: &str,
    name: &str,
    variety: &str,
    category: &str,
    area: f64,
    expected_yield: f64,
    harvest_months: &[u8],
    region_code: &str,
    (lat, lng, address): (f64, f64, &str),
    status: ProductStatus,
    contact: &str,
    rating: f32,
    updated_at: i64,
) -> Product {
    let picsum = |kind: &str| vec![format!("https://picsum.photos/seed/{}{}/600/400", kind, id)];
    Product {
        id: id.to_string(),
        farmer_id: farmer_id.to_string(),
        farmer_name: farmer_name.to_string(),
        name: name.to_string(),
        variety: variety.to_string(),
        category: category.to_string(),
        area,
        expected_yield,
        description: String::new(),
        harvest_months: harvest_months.to_vec(),
        images: ProductImages {
            orchard: picsum("garden"),
            product: picsum("product"),
            warehouse: picsum("pack"),
        },
        certificates: Vec::new(),
        region_code: region_code.to_string(),
        location: FarmLocation { lat, lng, address: address.to_string() },
        status,
        contact: contact.to_string(),
        rating,
        timeline: Vec::new(),
        updated_at: Timestamp::constant(updated_at, 0),
        verified_at: None,
        verified_by: None,
        verification_note: None,
    }
}

// Builder helpers for the seed data
trait SeedExt {
    fn with_description(self, text: &str) -> Self;
    fn with_cert(self, cert_type: CertType, proof: &str, issued: Date, expires: Date) -> Self;
    fn with_timeline(self, id: &str, date: Date, stage: &str, description: &str) -> Self;
}

impl SeedExt for Product {
    fn with_description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    fn with_cert(mut self, cert_type: CertType, proof: &str, issued: Date, expires: Date) -> Self {
        self.certificates.push(Certificate {
            cert_type,
            proof: proof.to_string(),
            issue_date: issued,
            expiry_date: expires,
        });
        self
    }

    fn with_timeline(mut self, id: &str, date: Date, stage: &str, description: &str) -> Self {
        self.timeline.push(TimelineEntry {
            id: id.to_string(),
            date,
            stage: stage.to_string(),
            description: description.to_string(),
            image: Some(format!("https://picsum.photos/seed/{}/200", id)),
        });
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::AdminLevel;

    /// Minimal approved-or-not product for tests across the crate.
    pub(crate) fn product(id: &str, name: &str, status: ProductStatus) -> Product {
        seed(
            id, "f1", "Nông hộ", name, "", "Trái cây", 1.0, 2.0, &[6], &format!("PUC-{}", id),
            (10.0, 106.0, "Châu Thành, Bến Tre"), status, "0900000000", 0.0, 1698192000,
        )
    }

    fn reviewer() -> Reviewer {
        let viewer = Viewer {
            name: "Nguyễn Văn Quản Lý".to_string(),
            role: Role::Admin {
                admin_id: "GOV-889".to_string(),
                level: AdminLevel::Central,
                assigned_area: "Toàn quốc".to_string(),
            },
        };
        Reviewer::from_viewer(&viewer).expect("admin viewer")
    }

    fn registration() -> Registration {
        Registration {
            farmer_id: "f_current".to_string(),
            farmer_name: "HTX Nông Nghiệp Xanh".to_string(),
            name: "Bưởi Năm Roi".to_string(),
            category: "Trái cây".to_string(),
            harvest_months: vec![9, 10],
            region_code: "VN-VLG-PUC-099".to_string(),
            address: "Bình Minh, Vĩnh Long".to_string(),
            certificates: vec![CertificateUpload {
                cert_type: CertType::VietGap,
                proof: "upload.pdf".to_string(),
                expiry_date: date(2026, 12, 31),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_register_prepends_pending_product() {
        let mut catalog = Catalog::seeded();
        let before = catalog.products().len();
        let today = date(2024, 4, 1);
        let id = catalog.register(registration(), today).expect("valid registration");

        assert_eq!(catalog.products().len(), before + 1);
        let first = &catalog.products()[0];
        assert_eq!(first.id, id);
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        assert_eq!(first.status, ProductStatus::Pending);
        assert_eq!(first.certificates[0].issue_date, today);
        assert_eq!((first.location.lat, first.location.lng), DEFAULT_REGISTRATION_POINT);
        assert_eq!(first.images.product, vec![PLACEHOLDER_IMAGE.to_string()]);
    }

    #[test]
    fn test_register_rejects_incomplete_submission() {
        let mut catalog = Catalog::seeded();
        let mut reg = registration();
        reg.harvest_months.clear();
        assert!(catalog.register(reg, date(2024, 4, 1)).is_err());

        let mut reg = registration();
        reg.region_code = "  ".to_string();
        assert!(catalog.register(reg, date(2024, 4, 1)).is_err());

        let mut reg = registration();
        reg.harvest_months = vec![13];
        assert!(catalog.register(reg, date(2024, 4, 1)).is_err());
    }

    #[test]
    fn test_review_approves_and_logs() {
        let mut catalog = Catalog::seeded();
        let audit_before = catalog.audit_log().count();
        catalog
            .review("2", Decision::Approve { note: "Đủ hồ sơ".to_string() }, &reviewer())
            .expect("pending product can be reviewed");

        let p = catalog.get("2").expect("seeded product");
        assert_eq!(p.status, ProductStatus::Approved);
        assert_eq!(p.verification_note.as_deref(), Some("Đủ hồ sơ"));
        assert_eq!(p.verified_by.as_deref(), Some("Nguyễn Văn Quản Lý"));
        assert!(p.verified_at.is_some());

        let latest = catalog.audit_log().next().expect("audit entry");
        assert_eq!(catalog.audit_log().count(), audit_before + 1);
        assert_eq!(latest.target_id, "2");
        assert_eq!(latest.action, "Duyệt hồ sơ");
    }

    #[test]
    fn test_review_requires_queue_status() {
        let mut catalog = Catalog::seeded();
        let err = catalog.review("1", Decision::Reject { reason: "x".to_string() }, &reviewer());
        assert!(err.is_err());
        assert!(catalog.review("missing", Decision::Approve { note: String::new() }, &reviewer()).is_err());
    }

    #[test]
    fn test_resubmit_moves_rejected_to_requeue() {
        let mut catalog = Catalog::seeded();
        catalog.resubmit("6").expect("rejected product");
        assert_eq!(catalog.get("6").map(|p| p.status), Some(ProductStatus::RePending));
        assert!(catalog.pending().any(|p| p.id == "6"));
        assert!(catalog.resubmit("1").is_err());
    }

    #[test]
    fn test_expire_certificates() {
        let mut catalog = Catalog::seeded();
        // Bưởi's only VietGAP certificate runs out on 2025-05-10
        let expired = catalog.expire_certificates(date(2025, 6, 1));
        assert_eq!(expired, 1);
        assert_eq!(catalog.get("1").map(|p| p.status), Some(ProductStatus::Expired));
        assert_eq!(catalog.get("3").map(|p| p.status), Some(ProductStatus::Approved));
    }

    #[test]
    fn test_stats_and_breakdown() {
        let catalog = Catalog::new(vec![
            product("a", "A", ProductStatus::Approved),
            product("b", "B", ProductStatus::Pending),
            Product { category: "Lúa gạo".to_string(), ..product("c", "C", ProductStatus::Rejected) },
        ]);
        let stats = catalog.stats();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.pending, 1);
        assert!((stats.total_area - 3.0).abs() < 1e-9);
        assert!((stats.total_yield - 6.0).abs() < 1e-9);

        let shares = catalog.category_breakdown();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, "Trái cây");
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[1].category, "Lúa gạo");
    }

    #[test]
    fn test_certificate_register_flags_expired() {
        let catalog = Catalog::seeded();
        let rows = catalog.certificate_register(date(2024, 6, 1));
        let robusta = rows.iter().find(|r| r.region_code == "VN-DLK-PUC-042").expect("row");
        assert!(robusta.expired);
        let xoai = rows.iter().find(|r| r.region_code == "VN-TGG-PUC-007").expect("row");
        assert!(!xoai.expired);
    }

    #[test]
    fn test_load_json_accepts_bare_product_array() {
        let catalog = Catalog::seeded();
        let dir = std::env::temp_dir().join(format!("pucmap-test-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("catalog.json");
        fs::write(&path, serde_json::to_string(catalog.products()).expect("serialize"))
            .expect("write");

        let loaded = Catalog::load_json(&path).expect("load");
        let ids: Vec<&str> = loaded.products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
        assert_eq!(loaded.get("2").map(|p| p.status), Some(ProductStatus::Pending));
        assert_eq!(loaded.audit_log().count(), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_json_reports_the_bad_product_field() {
        let dir = std::env::temp_dir().join(format!("pucmap-test-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("catalog.json");
        let mut value = serde_json::to_value(Catalog::seeded().products()).expect("serialize");
        value[0].as_object_mut().expect("product object").remove("region_code");
        fs::write(&path, format!("  \n{}", value)).expect("write");

        let err = format!("{:#}", Catalog::load_json(&path).expect_err("missing field"));
        assert!(err.contains("region_code"), "{}", err);
        assert!(!err.contains("struct Catalog"), "{}", err);
        let _ = fs::remove_dir_all(&dir);
    }
}
