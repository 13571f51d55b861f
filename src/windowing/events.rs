use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use bitflags::bitflags;
use glam::{Vec2, vec2};
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::layout::Rect;

/// Identity used to route pointer events to whoever declared interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(u64);

impl Tag {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::new()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PointerKinds: u8 {
        const PRESS = 1 << 0;
        const RELEASE = 1 << 1;
        const MOVE = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Release,
    Move,
}

impl PointerKind {
    fn flag(self) -> PointerKinds {
        match self {
            PointerKind::Press => PointerKinds::PRESS,
            PointerKind::Release => PointerKinds::RELEASE,
            PointerKind::Move => PointerKinds::MOVE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Device pixels, same space as [`HitArea::rect`].
    pub position: Vec2,
    pub button: Option<MouseButton>,
}

/// Input region declared by a frame, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitArea {
    pub tag: Tag,
    pub kinds: PointerKinds,
    pub rect: Rect,
}

/// Routes pointer events to the tags of the last rendered frame and queues
/// them until the next frame reads them.
#[derive(Debug, Default)]
pub struct Router {
    areas: Vec<HitArea>,
    queues: HashMap<Tag, Vec<PointerEvent>>,
    grab: Option<Tag>,
    cursor: Vec2,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the hit areas of a freshly rendered frame.
    pub fn set_areas(&mut self, areas: Vec<HitArea>) {
        self.areas = areas;
    }

    pub fn areas(&self) -> &[HitArea] {
        &self.areas
    }

    /// Turn a window event into a pointer event, if it is one.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = vec2(position.x as f32, position.y as f32);
                Some(PointerEvent {
                    kind: PointerKind::Move,
                    position: self.cursor,
                    button: None,
                })
            }
            WindowEvent::MouseInput { state, button, .. } => Some(PointerEvent {
                kind: match state {
                    ElementState::Pressed => PointerKind::Press,
                    ElementState::Released => PointerKind::Release,
                },
                position: self.cursor,
                button: Some(*button),
            }),
            _ => None,
        }
    }

    /// Queue `event` for the tag it belongs to. Returns whether anyone got it.
    pub fn dispatch(&mut self, event: PointerEvent) -> bool {
        let target = match event.kind {
            PointerKind::Press => {
                let hit = self.hit(event.position, PointerKind::Press);
                self.grab = hit;
                hit
            }
            PointerKind::Release => match self.grab.take() {
                Some(tag) if self.accepts(tag, PointerKind::Release) => Some(tag),
                Some(_) => None,
                None => self.hit(event.position, PointerKind::Release),
            },
            PointerKind::Move => self.hit(event.position, PointerKind::Move),
        };

        match target {
            Some(tag) => {
                log::trace!("pointer {:?} -> {:?}", event.kind, tag);
                self.queues.entry(tag).or_default().push(event);
                true
            }
            None => false,
        }
    }

    /// Drain the events queued for `tag`.
    pub fn events(&mut self, tag: Tag) -> Vec<PointerEvent> {
        self.queues.remove(&tag).unwrap_or_default()
    }

    fn hit(&self, pos: Vec2, kind: PointerKind) -> Option<Tag> {
        self.areas
            .iter()
            .rev()
            .find(|a| a.kinds.contains(kind.flag()) && a.rect.contains(pos))
            .map(|a| a.tag)
    }

    fn accepts(&self, tag: Tag, kind: PointerKind) -> bool {
        self.areas
            .iter()
            .any(|a| a.tag == tag && a.kinds.contains(kind.flag()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(x: f32, y: f32) -> PointerEvent {
        PointerEvent {
            kind: PointerKind::Press,
            position: vec2(x, y),
            button: Some(MouseButton::Left),
        }
    }

    fn release(x: f32, y: f32) -> PointerEvent {
        PointerEvent {
            kind: PointerKind::Release,
            ..press(x, y)
        }
    }

    fn area(tag: Tag, x: f32, y: f32) -> HitArea {
        HitArea {
            tag,
            kinds: PointerKinds::PRESS | PointerKinds::RELEASE,
            rect: Rect::new(vec2(x, y), vec2(100.0, 100.0)),
        }
    }

    #[test]
    fn tags_are_unique() {
        assert_ne!(Tag::new(), Tag::new());
    }

    #[test]
    fn press_inside_is_delivered() {
        let tag = Tag::new();
        let mut router = Router::new();
        router.set_areas(vec![area(tag, 350.0, 300.0)]);

        assert!(router.dispatch(press(400.0, 350.0)));
        assert_eq!(router.events(tag), vec![press(400.0, 350.0)]);
        assert!(router.events(tag).is_empty());
    }

    #[test]
    fn press_outside_is_dropped() {
        let tag = Tag::new();
        let mut router = Router::new();
        router.set_areas(vec![area(tag, 350.0, 300.0)]);

        assert!(!router.dispatch(press(10.0, 10.0)));
        assert!(router.events(tag).is_empty());
    }

    #[test]
    fn release_follows_the_press_outside_the_area() {
        let tag = Tag::new();
        let mut router = Router::new();
        router.set_areas(vec![area(tag, 350.0, 300.0)]);

        router.dispatch(press(400.0, 350.0));
        assert!(router.dispatch(release(0.0, 0.0)));
        let kinds: Vec<_> = router.events(tag).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PointerKind::Press, PointerKind::Release]);
    }

    #[test]
    fn press_on_far_corner_misses() {
        let tag = Tag::new();
        let mut router = Router::new();
        router.set_areas(vec![area(tag, 350.0, 300.0)]);
        assert_eq!(router.areas().len(), 1);

        assert!(!router.dispatch(press(450.0, 400.0)));
        assert!(!router.dispatch(press(450.0, 350.0)));
        assert!(!router.dispatch(press(400.0, 400.0)));
        assert!(router.dispatch(press(449.0, 399.0)));
        assert_eq!(router.events(tag).len(), 1);
    }

    #[test]
    fn topmost_area_wins() {
        let below = Tag::new();
        let above = Tag::new();
        let mut router = Router::new();
        router.set_areas(vec![area(below, 0.0, 0.0), area(above, 50.0, 50.0)]);

        router.dispatch(press(75.0, 75.0));
        assert!(router.events(below).is_empty());
        assert_eq!(router.events(above).len(), 1);
    }

    #[test]
    fn move_needs_move_interest() {
        let tag = Tag::new();
        let mut router = Router::new();
        router.set_areas(vec![area(tag, 0.0, 0.0)]);

        let mv = PointerEvent {
            kind: PointerKind::Move,
            ..press(10.0, 10.0)
        };
        assert!(!router.dispatch(mv));
    }
}
