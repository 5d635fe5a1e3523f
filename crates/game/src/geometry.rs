use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box described by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Square box of edge `size` centred on `center`.
    pub fn from_center(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Strict overlap; boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }
}

/// Play area spanning `[0, width] x [0, height]`, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Clamps a box centre so a box of edge `size` stays fully inside.
    pub fn clamp_center(&self, center: Vec2, size: f32) -> Vec2 {
        let half = (size * 0.5).min(self.width * 0.5).min(self.height * 0.5);
        Vec2::new(
            center.x.clamp(half, self.width - half),
            center.y.clamp(half, self.height - half),
        )
    }

    pub fn contains_with_margin(&self, point: Vec2, margin: f32) -> bool {
        self.area().expand(margin).contains(point)
    }

    /// Point on the perimeter. `side` is 0 top, 1 right, 2 bottom, 3 left; `t` in [0, 1]
    /// runs along the edge.
    pub fn edge_point(&self, side: u8, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        match side % 4 {
            0 => Vec2::new(t * self.width, 0.0),
            1 => Vec2::new(self.width, t * self.height),
            2 => Vec2::new(t * self.width, self.height),
            _ => Vec2::new(0.0, t * self.height),
        }
    }
}

/// Moves `from` toward `to` by at most `max_step` without overshooting.
pub fn step_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        to
    } else {
        from + delta / distance * max_step
    }
}
