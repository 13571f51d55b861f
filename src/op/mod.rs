//! The operation buffer a frame is recorded into.
//!
//! Drawing functions never touch pixels. They append [`Op`] values to an
//! [`Ops`] list which the rasterizer later replays in order. Drawing state
//! (transform, clip, material, pointer area) is implicit in that order and
//! can be saved and restored with [`Ops::save`] / [`SaveState::load`].

pub mod clip;
pub mod paint;

use glam::{Affine2, Vec2, vec2};

use crate::{
    layout::Rect,
    windowing::events::{PointerKinds, Tag},
};

pub use clip::{Circle, ClipRect, ClipShape, Outline, Path, PathSpec, RRect};
pub use paint::{Color, ColorOp, ImageOp, PaintOp, TextOp};

#[derive(Debug, Clone)]
pub enum Op {
    Save(u32),
    Load(u32),
    Transform(Affine2),
    Clip(ClipShape),
    Color(Color),
    Image(ImageOp),
    Paint,
    Text(TextOp),
    PointerArea(Rect),
    PointerInput { tag: Tag, kinds: PointerKinds },
    Invalidate,
}

#[derive(Debug, Default)]
pub struct Ops {
    list: Vec<Op>,
    next_state: u32,
}

impl Ops {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every recorded op. Called once at the start of a frame.
    pub fn reset(&mut self) {
        self.list.clear();
        self.next_state = 0;
    }

    pub fn push(&mut self, op: Op) {
        self.list.push(op);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Record the current drawing state. Restore it with [`SaveState::load`].
    pub fn save(&mut self) -> SaveState {
        let id = self.next_state;
        self.next_state += 1;
        self.list.push(Op::Save(id));
        SaveState { id }
    }

    /// Run `f` with the drawing state restored afterwards.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Ops) -> R) -> R {
        let state = self.save();
        let out = f(self);
        state.load(self);
        out
    }
}

impl<'a> IntoIterator for &'a Ops {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

#[must_use = "a saved state does nothing until it is loaded"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveState {
    id: u32,
}

impl SaveState {
    pub fn load(self, ops: &mut Ops) {
        ops.push(Op::Load(self.id));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOp(pub Affine2);

impl TransformOp {
    pub fn offset(by: Vec2) -> Self {
        Self(Affine2::from_translation(by))
    }

    pub fn scale(origin: Vec2, factor: Vec2) -> Self {
        Self(
            Affine2::from_translation(origin)
                * Affine2::from_scale(factor)
                * Affine2::from_translation(-origin),
        )
    }

    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Transform(self.0));
    }
}

/// Shift everything drawn afterwards by `(x, y)`.
pub fn offset(ops: &mut Ops, x: f32, y: f32) {
    TransformOp::offset(vec2(x, y)).add(ops);
}

/// Ask for another frame as soon as this one is presented.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidateOp;

impl InvalidateOp {
    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Invalidate);
    }
}
