use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::Float;

/// Wraps an angle in radians into `(-pi, pi]`.
pub fn normalize_angle<F: Float>(angle: F) -> F {
    let pi = F::pi();
    let two_pi = F::two_pi();
    let wrapped = angle % two_pi;

    if wrapped > pi {
        wrapped - two_pi
    } else if wrapped <= -pi {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Counter-clockwise rotation of a displacement by `angle` radians.
#[inline]
pub fn rotate<F: Float>(v: &na::Vector2<F>, angle: F) -> na::Vector2<F> {
    na::UnitComplex::new(angle) * *v
}

/// Signed angle that takes the direction of `from` onto the direction of `to`.
#[inline]
pub fn turn_between<F: Float>(from: &na::Vector2<F>, to: &na::Vector2<F>) -> F {
    normalize_angle(na::RealField::atan2(to.y, to.x) - na::RealField::atan2(from.y, from.x))
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

impl AngleUnit {
    #[inline]
    pub fn to_radians(self, value: f32) -> f32 {
        match self {
            AngleUnit::Degrees => value.to_radians(),
            AngleUnit::Radians => value,
        }
    }
}

impl Default for AngleUnit {
    fn default() -> Self {
        AngleUnit::Degrees
    }
}

/// Operational area; ground truth outside of it is not scored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    /// [x_min, x_max, y_min, y_max], exclusive like the recorder's geofence
    Rect([f32; 4]),
    Polygon(Vec<[f32; 2]>),
}

impl Bounds {
    pub fn contains(&self, p: &na::Point2<f32>) -> bool {
        match self {
            Bounds::Rect([x_min, x_max, y_min, y_max]) => {
                p.x > *x_min && p.x < *x_max && p.y > *y_min && p.y < *y_max
            }
            Bounds::Polygon(poly) => in_bounds(p, poly),
        }
    }
}

pub fn in_bounds(p: &na::Point2<f32>, poly: &[[f32; 2]]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = na::Point2::new(poly[0][0], poly[0][1]);
    let mut xints = 0.0;

    for i in 1..=n {
        let [x, y] = poly[i % n];
        let p2 = na::Point2::new(x, y);

        if p.y > p1.y.min(p2.y) && p.y <= p1.y.max(p2.y) && p.x <= p1.x.max(p2.x) {
            if (p1.y - p2.y).abs() > f32::EPSILON {
                xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            }

            if (p1.x - p2.x).abs() < f32::EPSILON || p.x <= xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}
