use crate::op::{Color, Ops, TextOp};

/// Body text size, in logical pixels.
pub const BODY2: f32 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub color: Color,
    pub size: f32,
}

impl Label {
    pub fn body2(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Color::rgb(0, 0, 0),
            size: BODY2,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Record the label at the current origin.
    pub fn layout(&self, ops: &mut Ops) {
        TextOp {
            text: self.text.clone(),
            color: self.color,
            size: self.size,
        }
        .add(ops);
    }
}
