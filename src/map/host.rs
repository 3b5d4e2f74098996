// Fire-and-forget requests to the host platform: turn-by-turn directions,
// the phone dialer and the device position.
use geo::Point;
use tracing::debug;

use crate::model::Product;

pub trait HostPlatform {
    fn open_url(&mut self, url: &str);
}

pub trait Geolocation {
    fn current_position(&self) -> Option<Point<f64>>;
}

/// Desktop stand-in for a GPS fix: a configured location, or nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Point<f64>>);

impl Geolocation for FixedLocation {
    fn current_position(&self) -> Option<Point<f64>> {
        self.0
    }
}

pub fn directions_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps/dir/?api=1&destination={},{}", lat, lng)
}

/// None when there is nothing dialable
pub fn dial_url(contact: &str) -> Option<String> {
    let number: String = contact.chars().filter(|c| !c.is_whitespace()).collect();
    if number.is_empty() { None } else { Some(format!("tel:{}", number)) }
}

pub fn open_directions(host: &mut dyn HostPlatform, product: &Product) {
    let url = directions_url(product.location.lat, product.location.lng);
    debug!("Directions to {}: {}", product.name, url);
    host.open_url(&url);
}

/// Returns false when the product has no contact number
pub fn call_contact(host: &mut dyn HostPlatform, product: &Product) -> bool {
    match dial_url(&product.contact) {
        Some(url) => {
            host.open_url(&url);
            true
        }
        None => {
            debug!("No contact number for {}", product.name);
            false
        }
    }
}
