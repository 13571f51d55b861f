pub mod context;
pub mod rect;

pub use context::Context;
pub use rect::Rect;
