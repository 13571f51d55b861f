pub mod events;

pub use events::{HitArea, PointerEvent, PointerKind, PointerKinds, Router, Tag};
