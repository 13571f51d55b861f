//! The shape tour: a fixed set of shapes, a progress bar that fills over
//! ten seconds, a bundled image and one clickable box.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use glam::{IVec2, Vec2, vec2};

use crate::{
    app::Scene,
    layout::{Context, Rect},
    op::{
        Circle, ClipRect, Color, ColorOp, ImageOp, InvalidateOp, Ops, Outline, PaintOp, RRect,
        TransformOp, clip::triangle, offset,
    },
    widgets::{Clickable, Label},
};

const LABEL_COLOR: Color = Color::rgb(145, 50, 168);

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub image_path: PathBuf,
    /// Time the progress bar takes to fill.
    pub progress_duration: Duration,
    pub image_scale: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("img/gopher.png"),
            progress_duration: Duration::from_secs(10),
            image_scale: 1.0,
        }
    }
}

pub struct Demo {
    start: Instant,
    image: ImageOp,
    button: Clickable,
    config: DemoConfig,
}

impl Demo {
    /// Load the configured image. Fails if it cannot be read or decoded.
    pub fn load(config: DemoConfig) -> crate::Result<Self> {
        let image = ImageOp::open(&config.image_path)?;
        Ok(Self::with_image(image, config))
    }

    pub fn with_image(image: ImageOp, config: DemoConfig) -> Self {
        Self {
            start: Instant::now(),
            image,
            button: Clickable::new(),
            config,
        }
    }

    pub fn pressed(&self) -> bool {
        self.button.pressed
    }
}

impl Scene for Demo {
    fn frame(&mut self, ctx: &mut Context<'_>) {
        draw_progress_bar(ctx.ops, ctx.now, self.start, self.config.progress_duration);
        draw_header(ctx.ops);
        draw_rounded_square_with_triangle(ctx.ops);
        draw_second_square(ctx.ops);
        draw_third_circle(ctx.ops);
        draw_five_rectangles(ctx.ops);
        draw_image(ctx.ops, &self.image, self.config.image_scale);
        do_button(ctx, &mut self.button);
    }
}

fn add_color(ops: &mut Ops, color: Color) {
    ColorOp { color }.add(ops);
}

fn draw_rect(ops: &mut Ops, w: i32, h: i32) {
    ClipRect::new(IVec2::new(w, h)).add(ops);
    PaintOp.add(ops);
}

/// Fraction of `duration` elapsed, clamped to 1.
pub fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0) as f32
}

/// A 200x20 bar growing from the left. Keeps requesting frames until full.
pub fn draw_progress_bar(ops: &mut Ops, now: Instant, start: Instant, duration: Duration) {
    let p = progress(now.saturating_duration_since(start), duration);
    if p < 1.0 {
        InvalidateOp.add(ops);
    }

    ops.scoped(|ops| {
        let width = (200.0 * p) as i32;
        ClipRect::new(IVec2::new(width, 20)).add(ops);
        add_color(ops, Color::rgb(0x80, 0, 0));
        add_color(ops, Color::rgb(0, 0x80, 0));
        PaintOp.add(ops);
    });
}

pub fn write_label(ops: &mut Ops, text: &str) {
    Label::body2(text).color(LABEL_COLOR).layout(ops);
}

pub fn draw_header(ops: &mut Ops) {
    ops.scoped(|ops| {
        offset(ops, 250.0, 0.0);
        write_label(ops, "Trying out the gio gui");
    });
}

pub fn draw_rounded_square_with_triangle(ops: &mut Ops) {
    ops.scoped(|ops| {
        let bounds = Rect::from_min_max(vec2(100.0, 100.0), vec2(200.0, 200.0));
        RRect::uniform(bounds, 15.0).add(ops);
        offset(ops, 100.0, 100.0);
        add_color(ops, Color::rgb(0x80, 0, 0));
        draw_rect(ops, 100, 100);

        Outline {
            path: triangle(100.0),
        }
        .add(ops);
        draw_rect(ops, 100, 100);
        add_color(ops, Color::rgb(0, 0x80, 0));
        PaintOp.add(ops);
    });
}

pub fn draw_second_square(ops: &mut Ops) {
    ops.scoped(|ops| {
        offset(ops, 250.0, 100.0);
        add_color(ops, Color::rgb(0, 0, 0x80));
        draw_rect(ops, 100, 100);
    });
}

pub fn draw_third_circle(ops: &mut Ops) {
    ops.scoped(|ops| {
        offset(ops, 350.0, 100.0);
        add_color(ops, Color::rgb(190, 82, 209));
        draw_circle(ops, vec2(100.0, 50.0), 50.0);
    });
}

fn draw_circle(ops: &mut Ops, center: Vec2, radius: f32) {
    Circle { center, radius }.add(ops);
    PaintOp.add(ops);
}

pub fn draw_five_rectangles(ops: &mut Ops) {
    ops.scoped(|ops| {
        offset(ops, 50.0, 225.0);
        add_color(ops, Color::rgb(252, 245, 53));

        for i in 1..6 {
            ops.scoped(|ops| {
                offset(ops, (i * 75) as f32, 0.0);
                draw_rect(ops, 50, 50);
            });
        }
    });
}

pub fn draw_image(ops: &mut Ops, image: &ImageOp, scale: f32) {
    ops.scoped(|ops| {
        offset(ops, 100.0, 300.0);
        if scale != 1.0 {
            TransformOp::scale(Vec2::ZERO, Vec2::splat(scale)).add(ops);
        }
        image.add(ops);
        PaintOp.add(ops);
    });
}

/// A 100x100 box below a label, red while held down, green otherwise. The
/// input region sits above the label offset, so it is shifted 20 units up
/// from the painted box.
pub fn do_button(ctx: &mut Context<'_>, button: &mut Clickable) {
    let state = ctx.ops.save();

    offset(ctx.ops, 350.0, 300.0);
    button.update(ctx.queue);
    button.layout(ctx.ops, IVec2::new(100, 100));

    write_label(ctx.ops, "Click me");
    offset(ctx.ops, 0.0, 20.0);

    ClipRect::new(IVec2::new(100, 100)).add(ctx.ops);
    let color = if button.pressed {
        Color::rgb(0xFF, 0, 0)
    } else {
        Color::rgb(0, 0xFF, 0)
    };
    add_color(ctx.ops, color);
    PaintOp.add(ctx.ops);

    state.load(ctx.ops);
}
