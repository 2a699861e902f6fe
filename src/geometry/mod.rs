//! Geometry primitives for clearance checking
//!
//! Submodules:
//! - `bbox`: Integer bounding boxes and R-tree candidate queries
//! - `distance`: Point, segment and polyline distances
//! - `pad`: Pad shapes and pad/trace clearances
//! - `polygon`: Outline and copper-area polygons with arc sides

pub mod bbox;
pub mod distance;
pub mod pad;
pub mod polygon;

pub use bbox::BBox;
pub use distance::Vec2;
pub use pad::{PadGeom, PadShape};
pub use polygon::{Corner, Polygon, Side, SideStyle};
