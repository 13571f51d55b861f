use glam::{Affine2, Vec2, vec2};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            origin: min,
            size: (max - min).max(Vec2::ZERO),
        }
    }

    pub fn min(&self) -> Vec2 {
        self.origin
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open: the min edges are inside, the max edges are not.
    pub fn contains(&self, p: Vec2) -> bool {
        let min = self.origin;
        let max = self.origin + self.size;
        p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
    }

    /// Overlap of two rects, empty (zero size) when they are disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect::from_min_max(self.min().max(other.min()), self.max().min(other.max()))
    }

    /// Axis-aligned bounds of this rect after mapping its corners through `t`.
    pub fn bounds_of(&self, t: &Affine2) -> Rect {
        let (min, max) = (self.min(), self.max());
        let corners = [
            t.transform_point2(min),
            t.transform_point2(vec2(max.x, min.y)),
            t.transform_point2(max),
            t.transform_point2(vec2(min.x, max.y)),
        ];
        let lo = corners.iter().fold(Vec2::INFINITY, |a, c| a.min(*c));
        let hi = corners.iter().fold(Vec2::NEG_INFINITY, |a, c| a.max(*c));
        Rect::from_min_max(lo, hi)
    }
}
