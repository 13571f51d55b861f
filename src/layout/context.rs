use std::time::Instant;

use glam::Vec2;

use crate::{op::Ops, windowing::events::Router};

/// Everything a scene needs to produce one frame.
pub struct Context<'a> {
    pub ops: &'a mut Ops,
    pub queue: &'a mut Router,
    pub now: Instant,
    /// Frame size in logical units.
    pub size: Vec2,
}

impl<'a> Context<'a> {
    pub fn new(ops: &'a mut Ops, queue: &'a mut Router, now: Instant, size: Vec2) -> Self {
        Self {
            ops,
            queue,
            now,
            size,
        }
    }
}
