use std::f64::consts::PI;

use super::Position;
use crate::constants::{EARTH_R, WGS84_A, WGS84_F};
use crate::maths::{angle_diff_deg, wrap_degrees};

/// Distance and direction between two positions on the Earth
pub trait Geodesy {
    /// Geodesic distance in meters
    fn distance(&self, from: &Position, to: &Position) -> f64;

    /// Initial bearing in degrees clockwise from north, in range `[0, 360)`
    fn initial_bearing(&self, from: &Position, to: &Position) -> f64;
}

impl<G: Geodesy + ?Sized> Geodesy for &G {
    fn distance(&self, from: &Position, to: &Position) -> f64 {
        (**self).distance(from, to)
    }

    fn initial_bearing(&self, from: &Position, to: &Position) -> f64 {
        (**self).initial_bearing(from, to)
    }
}

/// Solution of the inverse geodesic problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inverse {
    /// Meters
    pub distance: f64,
    /// Degrees in `[0, 360)`
    pub initial_bearing: f64,
    /// Degrees in `[0, 360)`
    pub final_bearing: f64,
}

/// Vincenty's inverse formulae on an ellipsoid of revolution
///
/// https://en.wikipedia.org/wiki/Vincenty%27s_formulae#Inverse_problem
#[derive(Debug, Clone, Copy)]
pub struct Vincenty {
    a: f64,
    f: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl Default for Vincenty {
    fn default() -> Self {
        Self::WGS84
    }
}

impl Vincenty {
    pub const WGS84: Self = Self {
        a: WGS84_A,
        f: WGS84_F,
        max_iterations: 1_000,
        tolerance: 1e-12,
    };

    /// The longitude difference is taken the short way round, so segments crossing the
    /// antimeridian are solved like any other.
    ///
    /// Returns `None` if the iteration fails to converge, which only happens for nearly
    /// antipodal points.
    pub fn inverse(&self, from: &Position, to: &Position) -> Option<Inverse> {
        let (a, f) = (self.a, self.f);
        let b = a * (1.0 - f);

        let phi1 = from.lat_deg().to_radians();
        let phi2 = to.lat_deg().to_radians();
        let l = angle_diff_deg(from.lon_deg(), to.lon_deg()).to_radians();

        // Reduced latitudes
        let tan_u1 = (1.0 - f) * phi1.tan();
        let cos_u1 = 1.0 / f64::sqrt(1.0 + tan_u1 * tan_u1);
        let sin_u1 = tan_u1 * cos_u1;
        let tan_u2 = (1.0 - f) * phi2.tan();
        let cos_u2 = 1.0 / f64::sqrt(1.0 + tan_u2 * tan_u2);
        let sin_u2 = tan_u2 * cos_u2;

        let mut lambda = l;
        let mut converged = false;
        let (mut sin_lambda, mut cos_lambda);
        let (mut sin_sigma, mut cos_sigma, mut sigma);
        let (mut cos_sq_alpha, mut cos_2sigma_m);

        let mut iterations = 0;
        loop {
            (sin_lambda, cos_lambda) = lambda.sin_cos();
            let x = cos_u2 * sin_lambda;
            let y = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
            let sin_sq_sigma = x * x + y * y;
            if sin_sq_sigma == 0.0 {
                // Coincident points
                return Some(Inverse {
                    distance: 0.0,
                    initial_bearing: 0.0,
                    final_bearing: 0.0,
                });
            }
            sin_sigma = sin_sq_sigma.sqrt();
            cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            sigma = f64::atan2(sin_sigma, cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            // Equatorial line: cos_sq_alpha = 0
            cos_2sigma_m = if cos_sq_alpha != 0.0 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };
            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let prev_lambda = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m
                                + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

            if lambda.abs() > PI {
                break;
            }
            if (lambda - prev_lambda).abs() <= self.tolerance {
                converged = true;
                break;
            }
            iterations += 1;
            if iterations >= self.max_iterations {
                break;
            }
        }

        if !converged {
            return None;
        }

        let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
        let big_a =
            1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

        let distance = b * big_a * (sigma - delta_sigma);
        let alpha1 = f64::atan2(
            cos_u2 * sin_lambda,
            cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda,
        );
        let alpha2 = f64::atan2(
            cos_u1 * sin_lambda,
            -sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda,
        );

        Some(Inverse {
            distance,
            initial_bearing: wrap_degrees(alpha1.to_degrees()),
            final_bearing: wrap_degrees(alpha2.to_degrees()),
        })
    }
}

impl Geodesy for Vincenty {
    fn distance(&self, from: &Position, to: &Position) -> f64 {
        match self.inverse(from, to) {
            Some(inv) => inv.distance,
            None => {
                tracing::debug!(%from, %to, "nearly antipodal, vincenty did not converge; using great circle");
                Spherical.distance(from, to)
            }
        }
    }

    fn initial_bearing(&self, from: &Position, to: &Position) -> f64 {
        match self.inverse(from, to) {
            Some(inv) => inv.initial_bearing,
            None => {
                tracing::debug!(%from, %to, "nearly antipodal, vincenty did not converge; using great circle");
                Spherical.initial_bearing(from, to)
            }
        }
    }
}

/// Great-circle formulae on a sphere of radius [`EARTH_R`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

impl Geodesy for Spherical {
    // https://en.wikipedia.org/wiki/Haversine_formula
    fn distance(&self, from: &Position, to: &Position) -> f64 {
        let phi1 = from.lat_deg().to_radians();
        let phi2 = to.lat_deg().to_radians();
        let d_phi = phi2 - phi1;
        let d_lambda = angle_diff_deg(from.lon_deg(), to.lon_deg()).to_radians();

        let h = (d_phi * 0.5).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda * 0.5).sin().powi(2);
        2.0 * EARTH_R * f64::atan2(h.sqrt(), (1.0 - h).max(0.0).sqrt())
    }

    fn initial_bearing(&self, from: &Position, to: &Position) -> f64 {
        let phi1 = from.lat_deg().to_radians();
        let phi2 = to.lat_deg().to_radians();
        let d_lambda = angle_diff_deg(from.lon_deg(), to.lon_deg()).to_radians();

        let x = d_lambda.sin() * phi2.cos();
        let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
        wrap_degrees(f64::atan2(x, y).to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn dms(d: f64, m: f64, s: f64) -> f64 {
        d.signum() * (d.abs() + m / 60.0 + s / 3600.0)
    }

    #[test]
    fn flinders_peak_to_buninyong() {
        // Worked example from Geoscience Australia
        let flinders = Position::from_degrees(
            dms(-37.0, 57.0, 3.72030),
            dms(144.0, 25.0, 29.52440),
        )
        .unwrap();
        let buninyong = Position::from_degrees(
            dms(-37.0, 39.0, 10.15610),
            dms(143.0, 55.0, 35.38390),
        )
        .unwrap();

        let inv = Vincenty::WGS84.inverse(&flinders, &buninyong).unwrap();
        assert_approx_eq!(inv.distance, 54_972.271, 0.01);
        assert_approx_eq!(inv.initial_bearing, dms(306.0, 52.0, 5.37), 1e-4);
        // The published figure is the reverse azimuth at Buninyong
        assert_approx_eq!(inv.final_bearing, dms(127.0, 10.0, 25.07) + 180.0, 1e-4);
    }

    #[test]
    fn one_degree_along_equator() {
        let a = Position::from_degrees(0.0, 0.0).unwrap();
        let b = Position::from_degrees(0.0, 1.0).unwrap();
        assert_approx_eq!(Vincenty::WGS84.distance(&a, &b), 111_319.490_793, 1e-3);
        assert_approx_eq!(Vincenty::WGS84.initial_bearing(&a, &b), 90.0, 1e-9);
        assert_approx_eq!(Vincenty::WGS84.initial_bearing(&b, &a), 270.0, 1e-9);
    }

    #[test]
    fn coincident_points() {
        let a = Position::from_degrees(28.0, -93.5).unwrap();
        let inv = Vincenty::WGS84.inverse(&a, &a).unwrap();
        assert_eq!(inv.distance, 0.0);
        assert_eq!(inv.initial_bearing, 0.0);
    }

    #[test]
    fn antipodal_falls_back_to_sphere() {
        let a = Position::from_degrees(0.0, 0.0).unwrap();
        let b = Position::from_degrees(0.5, 179.7).unwrap();
        let d = Vincenty::WGS84.distance(&a, &b);
        assert!(d.is_finite());
        assert!(d > 19_000_000.0 && d < 20_100_000.0);
        let bearing = Vincenty::WGS84.initial_bearing(&a, &b);
        assert!((0.0..360.0).contains(&bearing));
    }

    #[test]
    fn antimeridian_matches_prime_meridian() {
        let west = Position::from_degrees(20.0, 179.5).unwrap();
        let east = Position::from_degrees(20.0, -179.5).unwrap();
        let across = Vincenty::WGS84.inverse(&west, &east).unwrap();

        let mirror = Vincenty::WGS84
            .inverse(
                &Position::from_degrees(20.0, -0.5).unwrap(),
                &Position::from_degrees(20.0, 0.5).unwrap(),
            )
            .unwrap();
        assert_approx_eq!(across.distance, mirror.distance, 1e-3);
        assert_approx_eq!(across.initial_bearing, mirror.initial_bearing, 1e-9);
        assert!(across.distance < 105_000.0);

        assert_approx_eq!(
            Spherical.distance(&west, &east),
            Spherical.distance(
                &Position::from_degrees(20.0, -0.5).unwrap(),
                &Position::from_degrees(20.0, 0.5).unwrap()
            ),
            1e-3
        );
        assert_approx_eq!(Spherical.initial_bearing(&east, &west), 270.0, 0.5);
    }

    #[test]
    fn spherical_is_close_to_ellipsoid_for_short_hops() {
        let a = Position::from_degrees(25.0, -80.0).unwrap();
        let b = Position::from_degrees(26.0, -81.0).unwrap();
        let ellipsoid = Vincenty::WGS84.distance(&a, &b);
        let sphere = Spherical.distance(&a, &b);
        assert!((ellipsoid - sphere).abs() / ellipsoid < 0.005);
        assert!(
            angle_diff_deg(
                Vincenty::WGS84.initial_bearing(&a, &b),
                Spherical.initial_bearing(&a, &b)
            )
            .abs()
                < 0.5
        );
    }
}
