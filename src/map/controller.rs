use tracing::debug;

use super::host::{self, Geolocation, HostPlatform};
use super::markers::{MarkerLayer, SyncReport};
use super::search::SearchInput;
use super::selection::Selection;
use super::surface::{Flight, MapSurface, MarkerHandle};
use super::viewport::{CameraAction, CameraPolicy, SelectionEffect, ViewportDecision, decide};
use crate::model::{Product, ProductId};

/// User input the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Keystroke in the search field; never refilters
    Edit(String),
    FocusSearch,
    Submit,
    Suggestion(String),
    ClearSearch,
    MarkerClicked(MarkerHandle),
    CloseDetail,
    ToggleSaved,
    LocateMe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateOutcome {
    Moved,
    /// No position (permission denied or no fix). Nothing happens on screen.
    Unavailable,
}

/// Owns the map surface for as long as the map is mounted. Markers are torn
/// down when the controller is dropped.
pub struct MapController<S: MapSurface> {
    surface: S,
    markers: MarkerLayer,
    selection: Selection,
    search: SearchInput,
    policy: CameraPolicy,
    visible: Vec<Product>,
    /// Product ids and applied query of the last refresh
    shown: Option<(Vec<ProductId>, String)>,
    geolocation: Box<dyn Geolocation>,
}

impl<S: MapSurface> MapController<S> {
    pub fn mount(surface: S, policy: CameraPolicy, geolocation: Box<dyn Geolocation>) -> Self {
        debug!("Map mounted");
        Self {
            surface,
            markers: MarkerLayer::new(),
            selection: Selection::default(),
            search: SearchInput::default(),
            policy,
            visible: Vec::new(),
            shown: None,
            geolocation,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn search(&self) -> &SearchInput {
        &self.search
    }

    /// Text buffer for the search widget. Edits here behave like `MapEvent::Edit`.
    pub fn search_mut(&mut self) -> &mut SearchInput {
        &mut self.search
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn visible(&self) -> &[Product] {
        &self.visible
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker_for(&self, id: &str) -> Option<MarkerHandle> {
        self.markers.handle_for(id)
    }

    pub fn selected(&self) -> Option<&Product> {
        let id = self.selection.id()?;
        self.visible.iter().find(|p| p.id == id)
    }

    /// Push the parent's filtered list and applied query. Markers always
    /// follow the list; the camera and selection only react when the ids or
    /// the query differ from the previous call.
    pub fn show(&mut self, products: &[Product], applied_query: &str) -> Option<ViewportDecision> {
        let report: SyncReport = self.markers.sync(products, &mut self.surface);
        self.visible = products.to_vec();
        self.search.sync_applied(applied_query);

        let key: (Vec<ProductId>, String) =
            (products.iter().map(|p| p.id.clone()).collect(), applied_query.to_string());
        if self.shown.as_ref() == Some(&key) {
            // Same ids, but an entry may still have vanished from a stale selection
            self.drop_invisible_selection();
            return None;
        }
        self.shown = Some(key);

        let decision = decide(applied_query, products, &self.policy);
        debug!(
            "Refresh: query {:?}, {} results, markers +{} -{}, {:?}",
            applied_query,
            products.len(),
            report.added,
            report.removed,
            decision.rule
        );
        self.apply(&decision);
        Some(decision)
    }

    fn apply(&mut self, decision: &ViewportDecision) {
        match decision.camera {
            CameraAction::Keep => debug!("Camera kept ({:?})", decision.rule),
            CameraAction::FitBounds(fit) => self.surface.fit_bounds(fit),
            CameraAction::FlyTo(flight) => self.surface.fly_to(flight),
        }
        match &decision.selection {
            SelectionEffect::Clear => {
                if self.selection.clear() {
                    debug!("Selection cleared");
                }
            }
            SelectionEffect::Select(id) => {
                if self.selection.select(id.clone()) {
                    debug!("Selected {}", id);
                }
            }
            SelectionEffect::RetainIfVisible => self.drop_invisible_selection(),
        }
    }

    fn drop_invisible_selection(&mut self) {
        let visible = &self.visible;
        if self.selection.retain_if(|id| visible.iter().any(|p| p.id == id)) {
            debug!("Selection left the result list");
        }
    }

    /// Returns the newly applied query when the event commits one, so the
    /// caller can propagate it to sibling views and refilter.
    pub fn handle(&mut self, event: MapEvent) -> Option<String> {
        match event {
            MapEvent::Edit(text) => {
                self.search.edit(&text);
                None
            }
            MapEvent::FocusSearch => {
                self.search.focus();
                None
            }
            MapEvent::Submit => {
                let applied = self.search.submit().to_string();
                debug!("Search submitted: {:?}", applied);
                Some(applied)
            }
            MapEvent::Suggestion(text) => {
                let applied = self.search.pick_suggestion(&text).to_string();
                debug!("Suggestion picked: {:?}", applied);
                Some(applied)
            }
            MapEvent::ClearSearch => {
                self.search.clear();
                self.selection.clear();
                // Forces the next refresh back to the overview even if the
                // applied query was already empty
                self.shown = None;
                debug!("Search cleared");
                Some(String::new())
            }
            MapEvent::MarkerClicked(handle) => {
                self.click_marker(handle);
                None
            }
            MapEvent::CloseDetail => {
                self.selection.clear();
                None
            }
            MapEvent::ToggleSaved => {
                self.selection.toggle_saved();
                None
            }
            MapEvent::LocateMe => {
                self.locate();
                None
            }
        }
    }

    /// Returns false for handles that no longer belong to a placed marker
    pub fn click_marker(&mut self, handle: MarkerHandle) -> bool {
        let Some(id) = self.markers.product_for(handle).cloned() else {
            debug!("Click on unknown marker {:?} ignored", handle);
            return false;
        };
        let Some(target) = self.visible.iter().find(|p| p.id == id).map(|p| p.point()) else {
            return false;
        };
        self.selection.select(id);
        self.surface.fly_to(Flight {
            target,
            zoom: self.policy.marker_zoom,
            duration: self.policy.marker_duration,
        });
        true
    }

    pub fn locate(&mut self) -> LocateOutcome {
        match self.geolocation.current_position() {
            Some(target) => {
                self.surface.fly_to(Flight {
                    target,
                    zoom: self.policy.locate_zoom,
                    duration: self.policy.locate_duration,
                });
                LocateOutcome::Moved
            }
            None => {
                debug!("Geolocation unavailable, camera unchanged");
                LocateOutcome::Unavailable
            }
        }
    }

    pub fn open_directions(&self, platform: &mut dyn HostPlatform) -> bool {
        match self.selected() {
            Some(p) => {
                host::open_directions(platform, p);
                true
            }
            None => false,
        }
    }

    pub fn call_selected(&self, platform: &mut dyn HostPlatform) -> bool {
        self.selected().is_some_and(|p| host::call_contact(platform, p))
    }
}

impl<S: MapSurface> Drop for MapController<S> {
    fn drop(&mut self) {
        self.markers.clear(&mut self.surface);
        debug!("Map unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;
    use crate::filter::filter_products;
    use crate::map::host::FixedLocation;
    use crate::map::host::tests::RecordingHost;
    use crate::map::surface::tests::{Call, RecordingSurface, last_camera_call, live_markers};
    use crate::map::viewport::Rule;
    use crate::model::{AdminLevel, CategoryFilter, ProductStatus, Role, Viewer};
    use geo::Point;

    fn central_admin() -> Viewer {
        Viewer {
            name: "Nguyễn Văn Quản Lý".to_string(),
            role: Role::Admin {
                admin_id: "GOV-889".to_string(),
                level: AdminLevel::Central,
                assigned_area: "Toàn quốc".to_string(),
            },
        }
    }

    fn two_farms() -> Vec<Product> {
        let buoi = product("1", "Bưởi Da Xanh Bến Tre", ProductStatus::Approved);
        let mut sau_rieng = product("2", "Sầu riêng Ri6", ProductStatus::Pending);
        sau_rieng.location.lat = 10.25;
        sau_rieng.location.lng = 105.97;
        vec![buoi, sau_rieng]
    }

    fn mount(
        location: Option<Point<f64>>,
    ) -> (MapController<RecordingSurface>, std::rc::Rc<std::cell::RefCell<Vec<Call>>>) {
        let (surface, log) = RecordingSurface::new();
        let controller =
            MapController::mount(surface, CameraPolicy::default(), Box::new(FixedLocation(location)));
        (controller, log)
    }

    /// Parent-side round trip: commit a query, refilter, push the result back
    fn apply(
        controller: &mut MapController<RecordingSurface>,
        all: &[Product],
        viewer: &Viewer,
        event: MapEvent,
    ) -> Option<ViewportDecision> {
        let applied = controller.handle(event).expect("event commits a query");
        let filtered = filter_products(all, viewer, &applied, &CategoryFilter::All);
        controller.show(&filtered, &applied)
    }

    #[test]
    fn test_buyer_sees_only_approved_markers() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        let filtered = filter_products(&all, &Viewer::buyer(), "", &CategoryFilter::All);
        c.show(&filtered, "");
        assert_eq!(c.visible().len(), 1);
        assert_eq!(c.visible()[0].id, "1");
        assert_eq!(live_markers(&log.borrow()).len(), 1);
        assert!(matches!(last_camera_call(&log.borrow()), Some(Call::Fit(_))));
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_single_result_selects_and_flies() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        let admin = central_admin();
        c.show(&filter_products(&all, &admin, "", &CategoryFilter::All), "");

        c.handle(MapEvent::Edit("sầu riêng".to_string()));
        apply(&mut c, &all, &admin, MapEvent::Submit);

        assert_eq!(c.selected().map(|p| p.id.as_str()), Some("2"));
        match last_camera_call(&log.borrow()) {
            Some(Call::FlyTo(f)) => {
                assert_eq!(f.target, all[1].point());
                assert_eq!(f.zoom, 14.0);
            }
            other => panic!("expected fly-to, got {:?}", other),
        }
        assert_eq!(live_markers(&log.borrow()).len(), 1);
    }

    #[test]
    fn test_exact_name_tie_break() {
        let (mut c, _log) = mount(None);
        let all = vec![
            product("a", "Xoài A", ProductStatus::Approved),
            product("b", "Xoài B", ProductStatus::Approved),
        ];
        c.handle(MapEvent::Edit("Xoài A".to_string()));
        let decision = apply(&mut c, &all, &Viewer::buyer(), MapEvent::Submit);
        assert!(decision.is_some());
        assert_eq!(c.selected().map(|p| p.name.as_str()), Some("Xoài A"));

        // Both names contain the query, only one equals it
        let all = vec![
            product("a", "Xoài", ProductStatus::Approved),
            product("b", "Xoài B", ProductStatus::Approved),
        ];
        apply(&mut c, &all, &Viewer::buyer(), MapEvent::Suggestion("xoài".to_string()));
        assert_eq!(c.visible().len(), 2);
        assert_eq!(c.selected().map(|p| p.id.as_str()), Some("a"));
    }

    #[test]
    fn test_typing_does_not_refilter() {
        let (mut c, log) = mount(None);
        c.show(&two_farms(), "");
        let calls = log.borrow().len();
        assert_eq!(c.handle(MapEvent::Edit("bưởi".to_string())), None);
        assert_eq!(c.search().applied(), "");
        assert_eq!(log.borrow().len(), calls);
    }

    #[test]
    fn test_clear_resets_selection_and_fits_all() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        let admin = central_admin();
        c.handle(MapEvent::Edit("ri6".to_string()));
        apply(&mut c, &all, &admin, MapEvent::Submit);
        assert!(c.selection().is_open());

        apply(&mut c, &all, &admin, MapEvent::ClearSearch);
        assert!(!c.selection().is_open());
        assert_eq!(c.search().local(), "");
        assert_eq!(c.visible().len(), 2);
        assert_eq!(live_markers(&log.borrow()).len(), 2);
        match last_camera_call(&log.borrow()) {
            Some(Call::Fit(fit)) => {
                for p in &all {
                    let pt = p.point();
                    assert!(pt.x() > fit.bounds.min().x && pt.x() < fit.bounds.max().x);
                    assert!(pt.y() > fit.bounds.min().y && pt.y() < fit.bounds.max().y);
                }
            }
            other => panic!("expected fit, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_with_empty_applied_query_refits() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        c.show(&all, "");
        let handle = c.marker_for("2").expect("marker placed");
        c.click_marker(handle);
        assert!(matches!(last_camera_call(&log.borrow()), Some(Call::FlyTo(_))));

        // Typed but never submitted, so the applied query is still empty
        c.handle(MapEvent::Edit("xo".to_string()));
        let applied = c.handle(MapEvent::ClearSearch).expect("clear commits a query");
        assert_eq!(applied, "");
        let decision = c.show(&all, &applied).expect("clear forces a refresh");
        assert_eq!(decision.rule, Rule::Overview);
        assert!(matches!(last_camera_call(&log.borrow()), Some(Call::Fit(_))));
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_no_results_keeps_camera() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        c.show(&all, "");
        let before = last_camera_call(&log.borrow()).cloned();
        c.handle(MapEvent::Edit("thanh long".to_string()));
        apply(&mut c, &all, &Viewer::buyer(), MapEvent::Submit);
        assert_eq!(last_camera_call(&log.borrow()).cloned(), before);
        assert_eq!(c.marker_count(), 0);
    }

    #[test]
    fn test_marker_click_selects_and_zooms_in() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        c.show(&all, "");
        let handle = c.marker_for("2").expect("marker placed");
        c.handle(MapEvent::MarkerClicked(handle));
        assert_eq!(c.selection().id(), Some("2"));
        match last_camera_call(&log.borrow()) {
            Some(Call::FlyTo(f)) => {
                assert_eq!(f.zoom, 15.0);
                assert_eq!(f.duration, 1.5);
            }
            other => panic!("expected fly-to, got {:?}", other),
        }

        c.handle(MapEvent::CloseDetail);
        assert!(c.selected().is_none());
        assert!(!c.click_marker(MarkerHandle(999)));
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_search_overview_keeps_visible_selection() {
        let (mut c, _log) = mount(None);
        let all = vec![
            product("a", "Xoài A", ProductStatus::Approved),
            product("b", "Xoài B", ProductStatus::Approved),
            product("c", "Lúa ST25", ProductStatus::Approved),
        ];
        c.show(&all, "");
        let handle = c.marker_for("b").expect("marker placed");
        c.click_marker(handle);

        c.handle(MapEvent::Edit("xoài".to_string()));
        apply(&mut c, &all, &Viewer::buyer(), MapEvent::Submit);
        assert_eq!(c.selection().id(), Some("b"));

        c.handle(MapEvent::Edit("lúa gạo".to_string()));
        apply(&mut c, &all, &Viewer::buyer(), MapEvent::Submit);
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_unchanged_input_does_not_move_camera() {
        let (mut c, log) = mount(None);
        let all = two_farms();
        assert!(c.show(&all, "").is_some());
        let calls = log.borrow().len();
        assert!(c.show(&all, "").is_none());
        assert_eq!(log.borrow().len(), calls);
    }

    #[test]
    fn test_saved_flag_resets_when_selection_changes() {
        let (mut c, _log) = mount(None);
        c.show(&two_farms(), "");
        let first = c.marker_for("1").expect("marker");
        let second = c.marker_for("2").expect("marker");
        c.click_marker(first);
        c.handle(MapEvent::ToggleSaved);
        assert!(c.selection().saved());
        c.click_marker(second);
        assert!(!c.selection().saved());
    }

    #[test]
    fn test_locate() {
        let (mut c, log) = mount(None);
        assert_eq!(c.locate(), LocateOutcome::Unavailable);
        assert!(last_camera_call(&log.borrow()).is_none());

        let home = Point::new(106.3756, 10.2435);
        let (mut c, log) = mount(Some(home));
        c.handle(MapEvent::LocateMe);
        assert_eq!(
            last_camera_call(&log.borrow()),
            Some(&Call::FlyTo(Flight { target: home, zoom: 13.0, duration: 2.0 }))
        );
    }

    #[test]
    fn test_host_actions_need_a_selection() {
        let (mut c, _log) = mount(None);
        let mut host = RecordingHost::default();
        c.show(&two_farms(), "");
        assert!(!c.open_directions(&mut host));
        assert!(!c.call_selected(&mut host));

        let handle = c.marker_for("1").expect("marker");
        c.click_marker(handle);
        assert!(c.open_directions(&mut host));
        assert!(c.call_selected(&mut host));
        assert_eq!(host.opened.len(), 2);
        assert_eq!(host.opened[1], "tel:0900000000");
    }

    #[test]
    fn test_drop_tears_down_markers() {
        let (mut c, log) = mount(None);
        c.show(&two_farms(), "");
        assert_eq!(live_markers(&log.borrow()).len(), 2);
        drop(c);
        assert!(live_markers(&log.borrow()).is_empty());
    }
}
