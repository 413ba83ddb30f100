//! Some useful mathematical functions

/// Wrap an angle in degrees into `[0, 360)`
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed difference `a2 - a1` in degrees, in range `[-180, 180)`
pub fn angle_diff_deg(a1: f64, a2: f64) -> f64 {
    (a2 - a1 + 180.0).rem_euclid(360.0) - 180.0
}
