use glam::{IVec2, Vec2, vec2};

use super::{Op, Ops};
use crate::layout::Rect;

/// Shapes that can restrict where subsequent paints land.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipShape {
    Rect(ClipRect),
    RRect(RRect),
    Circle(Circle),
    Outline(PathSpec),
}

/// Pixel-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl ClipRect {
    pub fn new(max: IVec2) -> Self {
        Self {
            min: IVec2::ZERO,
            max,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_min_max(self.min.as_vec2(), self.max.as_vec2())
    }

    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Clip(ClipShape::Rect(self)));
    }
}

/// Rectangle with an independent radius per corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RRect {
    pub rect: Rect,
    pub se: f32,
    pub sw: f32,
    pub nw: f32,
    pub ne: f32,
}

impl RRect {
    pub fn uniform(rect: Rect, radius: f32) -> Self {
        Self {
            rect,
            se: radius,
            sw: radius,
            nw: radius,
            ne: radius,
        }
    }

    /// Radii in `[nw, ne, se, sw]` order, each limited to half the shorter side.
    pub fn clamped_radii(&self) -> [f32; 4] {
        let limit = (self.rect.size.x.min(self.rect.size.y) * 0.5).max(0.0);
        [self.nw, self.ne, self.se, self.sw].map(|r| r.clamp(0.0, limit))
    }

    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Clip(ClipShape::RRect(self)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Clip(ClipShape::Circle(self)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo(Vec2, Vec2),
}

/// A finished path, all points absolute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSpec {
    pub segments: Vec<Segment>,
}

/// Path builder. Pen commands ending in `_by` are relative to the current
/// pen position, the `_to` ones are absolute.
#[derive(Debug, Default)]
pub struct Path {
    segments: Vec<Segment>,
    pen: Vec2,
}

impl Path {
    pub fn begin() -> Self {
        Self::default()
    }

    pub fn pos(&self) -> Vec2 {
        self.pen
    }

    pub fn move_to(&mut self, to: Vec2) -> &mut Self {
        self.pen = to;
        self.segments.push(Segment::MoveTo(to));
        self
    }

    pub fn move_by(&mut self, delta: Vec2) -> &mut Self {
        self.move_to(self.pen + delta)
    }

    pub fn line_to(&mut self, to: Vec2) -> &mut Self {
        self.pen = to;
        self.segments.push(Segment::LineTo(to));
        self
    }

    pub fn line_by(&mut self, delta: Vec2) -> &mut Self {
        self.line_to(self.pen + delta)
    }

    pub fn quad_by(&mut self, ctrl: Vec2, delta: Vec2) -> &mut Self {
        let ctrl = self.pen + ctrl;
        let to = self.pen + delta;
        self.pen = to;
        self.segments.push(Segment::QuadTo(ctrl, to));
        self
    }

    pub fn end(self) -> PathSpec {
        PathSpec {
            segments: self.segments,
        }
    }
}

/// Clip to the area enclosed by a path. Open subpaths are closed implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub path: PathSpec,
}

impl Outline {
    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Clip(ClipShape::Outline(self.path)));
    }
}

/// Upright triangle inscribed in a `size` box, apex at the top middle.
pub fn triangle(size: f32) -> PathSpec {
    let half = size * 0.5;
    let mut p = Path::begin();
    p.move_by(vec2(half, 0.0))
        .line_by(vec2(half, size))
        .line_by(vec2(-size, 0.0))
        .line_by(vec2(half, -size));
    p.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_commands_accumulate() {
        let tri = triangle(100.0);
        assert_eq!(
            tri.segments,
            vec![
                Segment::MoveTo(vec2(50.0, 0.0)),
                Segment::LineTo(vec2(100.0, 100.0)),
                Segment::LineTo(vec2(0.0, 100.0)),
                Segment::LineTo(vec2(50.0, 0.0)),
            ]
        );
    }

    #[test]
    fn quad_control_is_relative_to_start() {
        let mut p = Path::begin();
        p.move_to(vec2(10.0, 10.0)).quad_by(vec2(5.0, -5.0), vec2(10.0, 0.0));
        assert_eq!(p.pos(), vec2(20.0, 10.0));
        assert_eq!(
            p.end().segments[1],
            Segment::QuadTo(vec2(15.0, 5.0), vec2(20.0, 10.0))
        );
    }

    #[test]
    fn radii_are_clamped_to_half_side() {
        let rr = RRect {
            rect: Rect::new(Vec2::ZERO, vec2(40.0, 20.0)),
            se: 30.0,
            sw: 5.0,
            nw: -1.0,
            ne: 10.0,
        };
        assert_eq!(rr.clamped_radii(), [0.0, 10.0, 10.0, 5.0]);
    }

    #[test]
    fn zero_width_rect_is_empty() {
        assert!(ClipRect::new(IVec2::new(0, 20)).is_empty());
        assert!(!ClipRect::new(IVec2::new(1, 20)).is_empty());
    }
}
