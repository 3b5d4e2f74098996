// The narrow interface the controller drives. The rendering side owns the
// real map state; the controller never reads camera state back.
use geo::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

/// Animated camera move to a point and zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight {
    pub target: Point<f64>,
    pub zoom: f64,
    /// Seconds
    pub duration: f64,
}

/// Camera move that makes `bounds` (already padded) fully visible
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsFit {
    pub bounds: Rect<f64>,
    pub duration: f64,
}

pub trait MapSurface {
    fn place_marker(&mut self, at: Point<f64>) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    /// A new request supersedes any camera move still in progress.
    fn fly_to(&mut self, flight: Flight);
    fn fit_bounds(&mut self, fit: BoundsFit);
}
