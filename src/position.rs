use geo::{Bearing, BoundingRect, Distance, Geodesic, MultiPoint, Point, Rect, coord};
use std::f64::consts::PI;

/// walkers renders 256px tiles
const TILE_SIZE: f64 = 256.0;
/// Web Mercator is undefined at the poles
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Format distance for display
/// < 1000m: show as meters
/// >= 1000m: show as km with 2 decimal places
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 { format!("{:.0} m", meters) } else { format!("{:.2} km", meters / 1000.0) }
}

/// Format bearing for display (compass direction)
pub fn format_bearing(degrees: f64) -> String {
    let directions = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let idx = ((degrees + 22.5) / 45.0) as usize % 8;
    format!("{:.0}° {}", degrees, directions[idx])
}

/// Get distance and bearing string between two points (lat, lon).
/// Returns None if either point is invalid
pub fn get_distance_bearing_string(from: (f64, f64), to: (f64, f64)) -> Option<String> {
    if !valid_lat_lon(from) || !valid_lat_lon(to) {
        return None;
    }
    let (distance, bearing) = distance_and_bearing(from, to);
    Some(format!("{} @ {}", format_distance(distance), format_bearing(bearing)))
}

pub fn valid_lat_lon((lat, lon): (f64, f64)) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

pub fn distance_and_bearing(p1: (f64, f64), p2: (f64, f64)) -> (f64, f64) {
    let start = Point::new(p1.1, p1.0);
    let end = Point::new(p2.1, p2.0);
    let distance = Geodesic.distance(start, end);
    let raw_bearing = Geodesic.bearing(start, end);
    let bearing = (raw_bearing + 360.0) % 360.0;
    (distance, bearing)
}

/// Bounding box of the points, grown on every side by `pad` times its
/// width/height. None for an empty set.
pub fn padded_bounds(points: &[Point<f64>], pad: f64) -> Option<Rect<f64>> {
    let rect = MultiPoint::from(points.to_vec()).bounding_rect()?;
    let dx = rect.width() * pad;
    let dy = rect.height() * pad;
    Some(Rect::new(
        coord! { x: rect.min().x - dx, y: (rect.min().y - dy).max(-MAX_MERCATOR_LAT) },
        coord! { x: rect.max().x + dx, y: (rect.max().y + dy).min(MAX_MERCATOR_LAT) },
    ))
}

/// Normalized Web Mercator y in [0, 1], 0 at the north edge.
fn mercator_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0
}

/// Largest zoom at which `bounds` fits inside a `width` x `height` pixel view.
pub fn fit_zoom(bounds: &Rect<f64>, width: f32, height: f32, min_zoom: f64, max_zoom: f64) -> f64 {
    // No room to fit anything into; show as much as possible
    if width <= 0.0 || height <= 0.0 {
        return min_zoom;
    }
    let span_x = bounds.width() / 360.0;
    let span_y = (mercator_y(bounds.min().y) - mercator_y(bounds.max().y)).abs();

    let zoom_for = |pixels: f32, span: f64| {
        if span <= f64::EPSILON { f64::INFINITY } else { (pixels as f64 / (TILE_SIZE * span)).log2() }
    };
    let zoom = zoom_for(width, span_x).min(zoom_for(height, span_y));
    if zoom.is_finite() { zoom.clamp(min_zoom, max_zoom) } else { max_zoom }
}

pub fn rect_center(bounds: &Rect<f64>) -> Point<f64> {
    Point::from(bounds.center())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_between_delta_cities() {
        // Bến Tre to Vĩnh Long, about 45 km roughly west
        let (dist, bearing) = distance_and_bearing((10.2435, 106.3756), (10.2397, 105.9572));
        assert!((dist - 45_800.0).abs() < 1_500.0, "dist={}", dist);
        assert!((260.0..280.0).contains(&bearing), "bearing={}", bearing);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(12_340.0), "12.34 km");
        assert_eq!(format_bearing(0.0), "0° N");
        assert_eq!(format_bearing(270.0), "270° W");
        assert!(get_distance_bearing_string((91.0, 0.0), (0.0, 0.0)).is_none());
    }

    #[test]
    fn test_padded_bounds() {
        let points = [Point::new(106.0, 10.0), Point::new(107.0, 11.0)];
        let rect = padded_bounds(&points, 0.1).expect("non-empty");
        assert!((rect.min().x - 105.9).abs() < 1e-9);
        assert!((rect.max().y - 11.1).abs() < 1e-9);
        assert!(padded_bounds(&[], 0.1).is_none());
    }

    #[test]
    fn test_fit_zoom_shrinks_with_wider_bounds() {
        let small = padded_bounds(&[Point::new(106.0, 10.0), Point::new(106.1, 10.1)], 0.0)
            .expect("bounds");
        let large = padded_bounds(&[Point::new(104.0, 8.0), Point::new(109.0, 13.0)], 0.0)
            .expect("bounds");
        let z_small = fit_zoom(&small, 800.0, 600.0, 2.0, 18.0);
        let z_large = fit_zoom(&large, 800.0, 600.0, 2.0, 18.0);
        assert!(z_small > z_large);
        // 0.1 degree across an 800x600 view lands around zoom 13
        assert!((10.0..14.0).contains(&z_small), "z_small={}", z_small);
    }

    #[test]
    fn test_fit_zoom_without_view_area_zooms_out() {
        let bounds = padded_bounds(&[Point::new(106.0, 10.0), Point::new(106.1, 10.1)], 0.1)
            .expect("bounds");
        assert_eq!(fit_zoom(&bounds, 0.0, 600.0, 2.0, 18.0), 2.0);
        assert_eq!(fit_zoom(&bounds, 800.0, 0.0, 2.0, 18.0), 2.0);
    }

    #[test]
    fn test_fit_zoom_single_point_uses_max_zoom() {
        let point = padded_bounds(&[Point::new(106.0, 10.0)], 0.3).expect("bounds");
        assert_eq!(fit_zoom(&point, 800.0, 600.0, 2.0, 17.0), 17.0);
    }
}
