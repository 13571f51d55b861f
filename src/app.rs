use crate::{
    Result,
    layout::Context,
    op::{Color, Ops},
    renderer::Renderer,
    windowing::events::Router,
};
use anyhow::Context as _;
use glam::vec2;
use std::{cell::RefCell, rc::Rc, sync::Arc, time::Instant};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

/// Something that records a frame of ops.
pub trait Scene {
    fn frame(&mut self, ctx: &mut Context<'_>);
}

impl<F> Scene for F
where
    F: FnMut(&mut Context<'_>),
{
    fn frame(&mut self, ctx: &mut Context<'_>) {
        self(ctx)
    }
}

struct WindowConfig {
    title: String,
    size: winit::dpi::LogicalSize<u32>,
    background: Color,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "opdraw".to_string(),
            size: winit::dpi::LogicalSize::new(800, 600),
            background: Color::WHITE,
        }
    }
}

pub struct App {
    scene: Box<dyn Scene>,
    window_config: WindowConfig,
}

impl App {
    pub fn new(scene: impl Scene + 'static) -> Self {
        Self {
            scene: Box::new(scene),
            window_config: WindowConfig::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window_config.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window_config.size = winit::dpi::LogicalSize::new(width, height);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.window_config.background = color;
        self
    }

    /// Open the window and drive the scene until the window closes.
    pub fn run(self) -> Result<()> {
        crate::init_logging();
        log::info!("Starting {}...", &self.window_config.title);

        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&self.window_config.title)
                .with_inner_size(self.window_config.size)
                .build(&event_loop)
                .context("failed to open window")?,
        );

        let mut renderer = pollster::block_on(Renderer::new(
            window.clone(),
            self.window_config.background,
        ))?;

        let mut scene = self.scene;
        let mut ops = Ops::new();
        let mut router = Router::new();
        let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::default();
        let failure_slot = failure.clone();

        event_loop.run(move |event, elwt| {
            let Event::WindowEvent { window_id, event } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }

            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                WindowEvent::Resized(sz) => {
                    renderer.resize(sz);
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { .. } => window.request_redraw(),
                WindowEvent::RedrawRequested => {
                    let scale = window.scale_factor() as f32;
                    let px = window.inner_size();
                    let size = vec2(px.width as f32, px.height as f32) / scale;

                    ops.reset();
                    scene.frame(&mut Context::new(&mut ops, &mut router, Instant::now(), size));

                    match renderer.render(&ops, scale) {
                        Ok(out) => {
                            router.set_areas(out.hit_areas);
                            if out.invalidate {
                                window.request_redraw();
                            }
                        }
                        Err(e) => {
                            log::error!("frame error: {e:#}");
                            *failure_slot.borrow_mut() = Some(e);
                            elwt.exit();
                        }
                    }
                }
                other => {
                    if let Some(ev) = router.translate(&other) {
                        if router.dispatch(ev) {
                            window.request_redraw();
                        }
                    }
                }
            }
        })?;

        match failure.borrow_mut().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
