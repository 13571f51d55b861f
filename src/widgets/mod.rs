pub mod button;
pub mod text;

pub use button::Clickable;
pub use text::Label;
