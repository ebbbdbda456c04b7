//! Planar geometry helpers shared by the world and the pure systems.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Category, ColliderId};

/// Static shape occupied by a collider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Disc described by its centre and radius.
    Circle {
        /// Centre of the disc in world units.
        center: Vec2,
        /// Radius of the disc in world units.
        radius: f32,
    },
    /// Axis-aligned rectangle described by two opposite corners.
    Rect {
        /// Corner with the smallest coordinates.
        min: Vec2,
        /// Corner with the largest coordinates.
        max: Vec2,
    },
}

impl Shape {
    /// Reports whether the point lies inside the shape, borders included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            Self::Circle { center, radius } => center.distance_squared(point) <= radius * radius,
            Self::Rect { min, max } => {
                point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
            }
        }
    }

    /// Reports whether the shape overlaps a disc.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        match *self {
            Self::Circle {
                center: own_center,
                radius: own_radius,
            } => {
                let reach = own_radius + radius;
                own_center.distance_squared(center) <= reach * reach
            }
            Self::Rect { min, max } => {
                let closest = center.clamp(min, max);
                closest.distance_squared(center) <= radius * radius
            }
        }
    }

    /// Returns the fraction along `start..end` at which a disc of radius
    /// `inflate` swept along the segment first touches the shape.
    ///
    /// Rectangles are inflated as boxes, so corners are slightly generous.
    #[must_use]
    pub fn segment_entry(&self, start: Vec2, end: Vec2, inflate: f32) -> Option<f32> {
        match *self {
            Self::Circle { center, radius } => {
                segment_circle_entry(start, end, center, radius + inflate)
            }
            Self::Rect { min, max } => {
                let padding = Vec2::splat(inflate);
                segment_rect_entry(start, end, min - padding, max + padding)
            }
        }
    }
}

/// Static body registered with the world for spatial queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Identifier of the collider, unique within an arena.
    pub id: ColliderId,
    /// Collision category the collider belongs to.
    pub category: Category,
    /// Area covered by the collider.
    pub shape: Shape,
}

impl Collider {
    /// Creates a new collider description.
    #[must_use]
    pub const fn new(id: ColliderId, category: Category, shape: Shape) -> Self {
        Self {
            id,
            category,
            shape,
        }
    }
}

/// Rotates a vector counter-clockwise by the provided angle in degrees.
#[must_use]
pub fn rotate_degrees(direction: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(
        cos * direction.x - sin * direction.y,
        sin * direction.x + cos * direction.y,
    )
}

/// Fraction along `start..end` at which the segment enters a disc.
///
/// Segments starting inside the disc report an entry at zero.
#[must_use]
pub fn segment_circle_entry(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let offset = start - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let direction = end - start;
    let a = direction.length_squared();
    if a <= f32::EPSILON {
        return None;
    }

    let b = 2.0 * offset.dot(direction);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

fn segment_rect_entry(start: Vec2, end: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let direction = end - start;
    let mut entry: f32 = 0.0;
    let mut exit: f32 = 1.0;

    for (origin, delta, low, high) in [
        (start.x, direction.x, min.x, max.x),
        (start.y, direction.y, min.y, max.y),
    ] {
        if delta.abs() <= f32::EPSILON {
            if origin < low || origin > high {
                return None;
            }
            continue;
        }

        let first = (low - origin) / delta;
        let second = (high - origin) / delta;
        let (near, far) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        entry = entry.max(near);
        exit = exit.min(far);
        if entry > exit {
            return None;
        }
    }

    Some(entry)
}
