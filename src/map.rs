// Map search & selection controller: binds the applied query, the filtered
// product list, the marker layer, the camera and the detail-panel selection.
pub mod controller;
pub mod host;
pub mod markers;
pub mod search;
pub mod selection;
pub mod surface;
pub mod viewport;

pub use controller::{MapController, MapEvent};
pub use surface::{BoundsFit, Flight, MapSurface, MarkerHandle};
pub use viewport::CameraPolicy;
