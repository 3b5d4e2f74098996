use geo::Point;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::surface::{MapSurface, MarkerHandle};
use crate::model::{Product, ProductId};

#[derive(Debug, Clone, Copy)]
struct PlacedMarker {
    handle: MarkerHandle,
    point: Point<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

/// One placed marker per visible product. The only writer of markers on the surface.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    by_product: FxHashMap<ProductId, PlacedMarker>,
    by_handle: FxHashMap<MarkerHandle, ProductId>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_product.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty()
    }

    pub fn product_for(&self, handle: MarkerHandle) -> Option<&ProductId> {
        self.by_handle.get(&handle)
    }

    pub fn handle_for(&self, id: &str) -> Option<MarkerHandle> {
        self.by_product.get(id).map(|m| m.handle)
    }

    /// Diff the placed markers against `products`: drop the ones that left,
    /// place the new ones, keep the rest untouched. A product that moved is re-placed.
    pub fn sync<S: MapSurface>(&mut self, products: &[Product], surface: &mut S) -> SyncReport {
        let mut report = SyncReport::default();
        let mut wanted: FxHashMap<&str, Point<f64>> = FxHashMap::default();
        for p in products {
            wanted.entry(p.id.as_str()).or_insert_with(|| p.point());
        }

        let stale: Vec<ProductId> = self
            .by_product
            .iter()
            .filter(|(id, placed)| wanted.get(id.as_str()) != Some(&placed.point))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            if let Some(placed) = self.by_product.remove(&id) {
                surface.remove_marker(placed.handle);
                self.by_handle.remove(&placed.handle);
                report.removed += 1;
            }
        }

        // Walk the input order so handles are issued in list order
        for p in products {
            if self.by_product.contains_key(&p.id) {
                if wanted.contains_key(p.id.as_str()) {
                    report.kept += 1;
                    // Count each id once even if the list repeats it
                    wanted.remove(p.id.as_str());
                }
                continue;
            }
            let point = p.point();
            let handle = surface.place_marker(point);
            self.by_product.insert(p.id.clone(), PlacedMarker { handle, point });
            self.by_handle.insert(handle, p.id.clone());
            wanted.remove(p.id.as_str());
            report.added += 1;
        }

        debug!(
            "Markers synced: +{} -{} ={} (total {})",
            report.added,
            report.removed,
            report.kept,
            self.len()
        );
        report
    }

    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) {
        for (_, placed) in self.by_product.drain() {
            surface.remove_marker(placed.handle);
        }
        self.by_handle.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;
    use crate::map::surface::tests::{Call, RecordingSurface, live_markers};
    use crate::model::ProductStatus;

    fn products(ids: &[&str]) -> Vec<Product> {
        ids.iter().map(|id| product(id, &format!("Vườn {}", id), ProductStatus::Approved)).collect()
    }

    #[test]
    fn test_sync_places_one_marker_per_product() {
        let (mut surface, log) = RecordingSurface::new();
        let mut layer = MarkerLayer::new();
        let report = layer.sync(&products(&["a", "b", "c"]), &mut surface);
        assert_eq!(report, SyncReport { added: 3, removed: 0, kept: 0 });
        assert_eq!(live_markers(&log.borrow()).len(), 3);
        assert!(layer.handle_for("b").is_some());
    }

    #[test]
    fn test_sync_diffs_against_previous_list() {
        let (mut surface, log) = RecordingSurface::new();
        let mut layer = MarkerLayer::new();
        layer.sync(&products(&["a", "b", "c"]), &mut surface);
        let kept_handle = layer.handle_for("b");

        let report = layer.sync(&products(&["b", "d"]), &mut surface);
        assert_eq!(report, SyncReport { added: 1, removed: 2, kept: 1 });
        assert_eq!(layer.handle_for("b"), kept_handle);
        assert!(layer.handle_for("a").is_none());

        let live = live_markers(&log.borrow());
        assert_eq!(live.len(), 2);
        for h in live {
            assert!(layer.product_for(h).is_some(), "stale marker {:?}", h);
        }
    }

    #[test]
    fn test_moved_product_is_replaced() {
        let (mut surface, log) = RecordingSurface::new();
        let mut layer = MarkerLayer::new();
        let mut list = products(&["a"]);
        layer.sync(&list, &mut surface);
        let old = layer.handle_for("a").expect("placed");

        list[0].location.lat += 0.5;
        let report = layer.sync(&list, &mut surface);
        assert_eq!(report, SyncReport { added: 1, removed: 1, kept: 0 });
        assert_ne!(layer.handle_for("a"), Some(old));
        assert!(log.borrow().contains(&Call::Remove(old)));
    }

    #[test]
    fn test_duplicate_ids_get_one_marker() {
        let (mut surface, log) = RecordingSurface::new();
        let mut layer = MarkerLayer::new();
        layer.sync(&products(&["a", "a"]), &mut surface);
        assert_eq!(layer.len(), 1);
        assert_eq!(live_markers(&log.borrow()).len(), 1);
    }

    #[test]
    fn test_clear_removes_everything() {
        let (mut surface, log) = RecordingSurface::new();
        let mut layer = MarkerLayer::new();
        layer.sync(&products(&["a", "b"]), &mut surface);
        layer.clear(&mut surface);
        assert!(layer.is_empty());
        assert!(live_markers(&log.borrow()).is_empty());
    }
}
