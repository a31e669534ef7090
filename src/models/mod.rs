pub mod code;
pub mod edge;
pub mod grid;
pub mod marker;
pub mod pixel;
pub mod point;

pub use code::{BAR_COUNT, CodeSequence, DATA_BAR_COUNT, MediaRef, SENTINELS, sentinels_valid};
pub use edge::{EdgeDirection, EdgeMap, EdgeRecord};
pub use grid::PixelGrid;
pub use marker::{AngleDetail, BoundaryDetail, ClusterBounds, GridEllipsoid};
pub use pixel::{EdgeScore, Pixel};
pub use point::Point;
