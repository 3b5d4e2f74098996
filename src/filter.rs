// Visible product subset for a viewer, a text query and a category constraint.
use crate::model::{CategoryFilter, Product, ProductStatus, Viewer};

/// Case-insensitive substring match against name, owner name or region code.
/// An empty query matches everything.
pub fn matches_query(product: &Product, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }
    product.name.to_lowercase().contains(query_lower)
        || product.farmer_name.to_lowercase().contains(query_lower)
        || product.region_code.to_lowercase().contains(query_lower)
}

/// Visibility rule: non-admins see approved products only, admins see every
/// status but only inside their assigned area unless they hold central scope.
pub fn visible_to(product: &Product, viewer: &Viewer) -> bool {
    if !viewer.is_admin() {
        return product.status == ProductStatus::Approved;
    }
    match viewer.area_token() {
        Some(token) => product.location.address.to_lowercase().contains(&token),
        None => true,
    }
}

/// Filter preserving input order. Pure, recomputed on every input change.
pub fn filter_products(
    products: &[Product],
    viewer: &Viewer,
    query: &str,
    category: &CategoryFilter,
) -> Vec<Product> {
    let query_lower = query.to_lowercase();
    products
        .iter()
        .filter(|p| visible_to(p, viewer))
        .filter(|p| matches_query(p, &query_lower))
        .filter(|p| category.matches(&p.category))
        .cloned()
        .collect()
}

/// Exact (case-insensitive) name match among already filtered products.
pub fn exact_name_match<'a>(products: &'a [Product], query: &str) -> Option<&'a Product> {
    let query_lower = query.to_lowercase();
    products.iter().find(|p| p.name.to_lowercase() == query_lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;
    use crate::model::{AdminLevel, Role};

    fn admin(level: AdminLevel, area: &str) -> Viewer {
        Viewer {
            name: "Cán bộ".to_string(),
            role: Role::Admin { admin_id: "GOV-889".to_string(), level, assigned_area: area.to_string() },
        }
    }

    fn sample() -> Vec<Product> {
        let mut buoi = product("1", "Bưởi Da Xanh Bến Tre", ProductStatus::Approved);
        buoi.location.address = "Châu Thành, Bến Tre".to_string();
        buoi.region_code = "VN-BTE-PUC-001".to_string();
        let mut sau_rieng = product("2", "Sầu riêng Ri6", ProductStatus::Pending);
        sau_rieng.location.address = "Long Hồ, Vĩnh Long".to_string();
        sau_rieng.category = "Trái cây".to_string();
        let mut lua = product("3", "Lúa ST25", ProductStatus::Approved);
        lua.category = "Lúa gạo".to_string();
        lua.farmer_name = "HTX Sóc Trăng".to_string();
        lua.location.address = "Mỹ Xuyên, Sóc Trăng".to_string();
        vec![buoi, sau_rieng, lua]
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_buyer_sees_only_approved() {
        let products = sample();
        let result = filter_products(&products, &Viewer::buyer(), "", &CategoryFilter::All);
        assert_eq!(names(&result), vec!["Bưởi Da Xanh Bến Tre", "Lúa ST25"]);
        assert!(result.iter().all(|p| p.status == ProductStatus::Approved));
    }

    #[test]
    fn test_central_admin_query_finds_pending() {
        let products = sample();
        let viewer = admin(AdminLevel::Central, "Toàn quốc");
        let result = filter_products(&products, &viewer, "sầu riêng", &CategoryFilter::All);
        assert_eq!(names(&result), vec!["Sầu riêng Ri6"]);
    }

    #[test]
    fn test_province_admin_restricted_to_area() {
        let products = sample();
        let viewer = admin(AdminLevel::Province, "Tỉnh Vĩnh Long");
        let result = filter_products(&products, &viewer, "", &CategoryFilter::All);
        assert_eq!(names(&result), vec!["Sầu riêng Ri6"]);
    }

    #[test]
    fn test_query_matches_owner_and_region_code() {
        let products = sample();
        let by_owner = filter_products(&products, &Viewer::buyer(), "sóc trăng", &CategoryFilter::All);
        assert_eq!(names(&by_owner), vec!["Lúa ST25"]);
        let by_code = filter_products(&products, &Viewer::buyer(), "bte-puc", &CategoryFilter::All);
        assert_eq!(names(&by_code), vec!["Bưởi Da Xanh Bến Tre"]);
    }

    #[test]
    fn test_query_and_category_compose_in_any_order() {
        let products = sample();
        let viewer = admin(AdminLevel::Central, "");
        let category = CategoryFilter::Only("Trái cây".to_string());
        for q in ["", "a", "ri", "lúa", "VN-", "zzz"] {
            let both = filter_products(&products, &viewer, q, &category);
            let query_first = filter_products(&products, &viewer, q, &CategoryFilter::All);
            let then_category = filter_products(&query_first, &viewer, "", &category);
            let category_first = filter_products(&products, &viewer, "", &category);
            let then_query = filter_products(&category_first, &viewer, q, &CategoryFilter::All);
            assert_eq!(both, then_category, "query={q}");
            assert_eq!(both, then_query, "query={q}");
        }
    }

    #[test]
    fn test_exact_name_match_ignores_case() {
        let mut a = product("a", "Xoài A", ProductStatus::Approved);
        a.region_code = "X-1".to_string();
        let b = product("b", "Xoài B", ProductStatus::Approved);
        let products = vec![a, b];
        let filtered = filter_products(&products, &Viewer::buyer(), "xoài a", &CategoryFilter::All);
        assert_eq!(filtered.len(), 1);
        let both = filter_products(&products, &Viewer::buyer(), "Xoài", &CategoryFilter::All);
        assert_eq!(exact_name_match(&both, "xoài b").map(|p| p.id.as_str()), Some("b"));
        assert!(exact_name_match(&both, "Xoài").is_none());
    }
}
