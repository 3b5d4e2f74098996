// walkers-backed map surface: markers, animated camera and click hit-testing
use eframe::egui;
use geo::Point;
use rustc_hash::FxHashMap;
use tracing::warn;
use walkers::{HttpTiles, Map, MapMemory, Plugin, Position, Projector};

use crate::map::{BoundsFit, Flight, MapSurface, MarkerHandle};
use crate::position::{fit_zoom, rect_center};

/// Clicks farther than this from every marker hit the bare map
const HIT_RADIUS: f32 = 14.0;

fn to_position(p: Point<f64>) -> Position {
    walkers::lat_lon(p.y(), p.x())
}

fn from_position(p: Position) -> Point<f64> {
    Point::new(p.x(), p.y())
}

fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveFlight {
    from: Point<f64>,
    from_zoom: f64,
    flight: Flight,
    started: f64,
}

impl ActiveFlight {
    /// Camera at `now` (seconds, egui clock) and whether the flight is over
    fn sample(&self, now: f64) -> (Point<f64>, f64, bool) {
        let t = if self.flight.duration <= 0.0 {
            1.0
        } else {
            ((now - self.started) / self.flight.duration).clamp(0.0, 1.0)
        };
        let e = ease_out(t);
        let lerp = |a: f64, b: f64| a + (b - a) * e;
        let center = Point::new(
            lerp(self.from.x(), self.flight.target.x()),
            lerp(self.from.y(), self.flight.target.y()),
        );
        (center, lerp(self.from_zoom, self.flight.zoom), t >= 1.0)
    }
}

/// A camera move waiting for the next frame, where the clock and the view
/// size are known
#[derive(Debug, Clone, Copy, PartialEq)]
enum CameraRequest {
    Fly(Flight),
    Fit(BoundsFit),
}

pub struct WalkersSurface {
    memory: MapMemory,
    tiles: Option<HttpTiles>,
    markers: FxHashMap<MarkerHandle, Point<f64>>,
    next_handle: u64,
    /// Last center we set. walkers keeps the live one; user drags move it.
    center: Point<f64>,
    min_zoom: f64,
    max_zoom: f64,
    request: Option<CameraRequest>,
    active: Option<ActiveFlight>,
}

impl WalkersSurface {
    pub fn new(center: Point<f64>, zoom: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let mut memory = MapMemory::default();
        memory.center_at(to_position(center));
        if memory.set_zoom(zoom).is_err() {
            warn!("Initial zoom {} rejected by the map widget", zoom);
        }
        Self {
            memory,
            tiles: None,
            markers: FxHashMap::default(),
            next_handle: 0,
            center,
            min_zoom,
            max_zoom,
            request: None,
            active: None,
        }
    }

    /// Initialize tiles if not already done
    fn ensure_tiles(&mut self, ctx: &egui::Context) {
        if self.tiles.is_none() {
            self.tiles = Some(HttpTiles::new(walkers::sources::OpenStreetMap, ctx.clone()));
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some() || self.request.is_some()
    }

    fn start_pending(&mut self, now: f64, view: egui::Vec2) {
        let Some(request) = self.request.take() else {
            return;
        };
        let flight = match request {
            CameraRequest::Fly(flight) => flight,
            CameraRequest::Fit(fit) => Flight {
                target: rect_center(&fit.bounds),
                zoom: fit_zoom(&fit.bounds, view.x, view.y, self.min_zoom, self.max_zoom),
                duration: fit.duration,
            },
        };
        // Start from wherever the user dragged the map to
        let from = self.memory.detached().map(from_position).unwrap_or(self.center);
        let from_zoom = self.memory.zoom();
        self.active = Some(ActiveFlight { from, from_zoom, flight, started: now });
    }

    fn step(&mut self, now: f64) {
        let Some(active) = self.active else {
            return;
        };
        let (center, zoom, done) = active.sample(now);
        let zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.memory.center_at(to_position(center));
        if self.memory.set_zoom(zoom).is_err() {
            warn!("Zoom {} rejected by the map widget", zoom);
        }
        self.center = center;
        if done {
            self.active = None;
        }
    }

    /// Draw the map into the remaining space. Returns the marker under a
    /// primary click, if any.
    pub fn show(&mut self, ui: &mut egui::Ui, selected: Option<MarkerHandle>) -> Option<MarkerHandle> {
        self.ensure_tiles(ui.ctx());
        let now = ui.input(|i| i.time);
        self.start_pending(now, ui.available_size());
        self.step(now);
        if self.is_animating() {
            ui.ctx().request_repaint();
        }

        let mut markers: Vec<_> = self
            .markers
            .iter()
            .map(|(handle, point)| {
                let is_selected = selected == Some(*handle);
                let (color, radius) = if is_selected {
                    (egui::Color32::YELLOW, 9.0)
                } else {
                    (egui::Color32::from_rgb(22, 163, 74), 6.0)
                };
                (*handle, to_position(*point), color, radius)
            })
            .collect();
        // Selected marker drawn last, on top
        markers.sort_by_key(|(handle, ..)| selected == Some(*handle));

        let mut clicked = None;
        let home = to_position(self.center);
        if let Some(ref mut tiles) = self.tiles {
            let plugin = MarkersPlugin { markers, clicked: &mut clicked };
            let map = Map::new(Some(tiles), &mut self.memory, home).with_plugin(plugin);
            ui.add(map);
        }
        clicked
    }
}

impl MapSurface for WalkersSurface {
    fn place_marker(&mut self, at: Point<f64>) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(handle, at);
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }

    fn fly_to(&mut self, flight: Flight) {
        self.request = Some(CameraRequest::Fly(flight));
    }

    fn fit_bounds(&mut self, fit: BoundsFit) {
        self.request = Some(CameraRequest::Fit(fit));
    }
}

/// Plugin for drawing product markers and hit-testing clicks on them
struct MarkersPlugin<'a> {
    markers: Vec<(MarkerHandle, Position, egui::Color32, f32)>,
    clicked: &'a mut Option<MarkerHandle>,
}

impl Plugin for MarkersPlugin<'_> {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let MarkersPlugin { markers, clicked } = *self;
        let painter = ui.painter();
        let mut projected = Vec::with_capacity(markers.len());

        for (handle, pos, color, radius) in &markers {
            let screen_vec = projector.project(*pos);
            let screen_pos = egui::pos2(screen_vec.x, screen_vec.y);
            painter.circle_filled(screen_pos, *radius, *color);
            painter.circle_stroke(screen_pos, *radius, egui::Stroke::new(1.5, egui::Color32::WHITE));
            projected.push((*handle, screen_pos));
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(click) = response.interact_pointer_pos()
        {
            *clicked = nearest_marker(&projected, click, HIT_RADIUS);
        }
    }
}

fn nearest_marker(
    projected: &[(MarkerHandle, egui::Pos2)],
    click: egui::Pos2,
    radius: f32,
) -> Option<MarkerHandle> {
    projected
        .iter()
        .map(|(handle, pos)| (*handle, pos.distance(click)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}
