pub mod app;
pub mod demo;
pub mod layout;
pub mod op;
pub mod renderer;
pub mod widgets;
pub mod windowing;

pub use app::{App, Scene};
pub use demo::{Demo, DemoConfig};
pub use layout::Context;
pub use op::Ops;
pub use renderer::Renderer;
pub use widgets::{Clickable, Label};

pub use glam::{IVec2, Vec2};

pub type Result<T> = anyhow::Result<T>;

/// Install the global logger. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
