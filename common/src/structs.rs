//! Basic structures: positions on the ellipsoid and the geodesy used between them

mod position;
pub use position::*;

mod geodetic;
pub use geodetic::*;
