use glam::{IVec2, Vec2};

use crate::{
    layout::Rect,
    op::{Op, Ops},
    windowing::events::{PointerKind, PointerKinds, Router, Tag},
};

/// Press/release tracking for a rectangular region.
#[derive(Debug, Clone)]
pub struct Clickable {
    pub tag: Tag,
    pub pressed: bool,
}

impl Clickable {
    pub fn new() -> Self {
        Self {
            tag: Tag::new(),
            pressed: false,
        }
    }

    /// Consume the pointer events that arrived since the last frame.
    /// Returns whether `pressed` changed.
    pub fn update(&mut self, queue: &mut Router) -> bool {
        let before = self.pressed;
        for ev in queue.events(self.tag) {
            match ev.kind {
                PointerKind::Press => self.pressed = true,
                PointerKind::Release => self.pressed = false,
                PointerKind::Move => {}
            }
        }
        if before != self.pressed {
            log::debug!("clickable {:?} pressed={}", self.tag, self.pressed);
        }
        before != self.pressed
    }

    /// Declare a `size` input region at the current origin.
    pub fn layout(&self, ops: &mut Ops, size: IVec2) {
        ops.push(Op::PointerArea(Rect::new(Vec2::ZERO, size.as_vec2())));
        ops.push(Op::PointerInput {
            tag: self.tag,
            kinds: PointerKinds::PRESS | PointerKinds::RELEASE,
        });
    }
}

impl Default for Clickable {
    fn default() -> Self {
        Self::new()
    }
}
