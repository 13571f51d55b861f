//! Replays an [`Ops`] list onto a CPU pixmap.
//!
//! The walk keeps one [`DrawState`] (transform, clip mask, material, pointer
//! area). Clips are device-space coverage masks; each new clip is intersected
//! with the previous one. `Save`/`Load` snapshot and restore the whole state.

use std::{collections::HashMap, rc::Rc};

use anyhow::anyhow;
use glam::{Affine2, Vec2, vec2};
use tiny_skia::{
    FillRule, FilterQuality, Mask, Paint, PathBuilder, Pattern, Pixmap, SpreadMode, Transform,
};

use super::text::TextRasterizer;
use crate::{
    layout::Rect,
    op::{ClipShape, Color, ImageOp, Op, Ops, PathSpec, RRect, TextOp, clip::Segment},
    windowing::events::HitArea,
};

/// Cubic control-point distance for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

/// Result of rasterizing one frame.
pub struct Frame {
    pub pixmap: Pixmap,
    pub hit_areas: Vec<HitArea>,
    /// The frame asked to be redrawn right away.
    pub invalidate: bool,
}

#[derive(Clone)]
enum Material {
    Color(Color),
    Image(ImageOp),
}

#[derive(Clone)]
struct DrawState {
    transform: Affine2,
    clip: Option<Rc<Mask>>,
    material: Material,
    area: Option<Rect>,
}

#[derive(Default)]
pub struct Rasterizer {
    text: Option<TextRasterizer>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `ops` into a fresh `width` x `height` pixmap. `scale` maps
    /// logical units to device pixels.
    pub fn rasterize(
        &mut self,
        ops: &Ops,
        width: u32,
        height: u32,
        scale: f32,
        background: Color,
    ) -> crate::Result<Frame> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid frame size {width}x{height}"))?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.a,
        ));

        let mut pass = Pass {
            pixmap,
            text: &mut self.text,
            state: DrawState {
                transform: Affine2::from_scale(Vec2::splat(scale)),
                clip: None,
                material: Material::Color(Color::rgb(0, 0, 0)),
                area: None,
            },
            saved: HashMap::new(),
            hit_areas: Vec::new(),
            invalidate: false,
        };

        for op in ops {
            pass.apply(op)?;
        }
        log::trace!("rasterized {} ops into {width}x{height}", ops.len());

        Ok(Frame {
            pixmap: pass.pixmap,
            hit_areas: pass.hit_areas,
            invalidate: pass.invalidate,
        })
    }
}

struct Pass<'a> {
    pixmap: Pixmap,
    text: &'a mut Option<TextRasterizer>,
    state: DrawState,
    saved: HashMap<u32, DrawState>,
    hit_areas: Vec<HitArea>,
    invalidate: bool,
}

impl Pass<'_> {
    fn apply(&mut self, op: &Op) -> crate::Result<()> {
        match op {
            Op::Save(id) => {
                self.saved.insert(*id, self.state.clone());
            }
            Op::Load(id) => match self.saved.get(id) {
                Some(state) => self.state = state.clone(),
                None => log::warn!("load of unknown state {id}"),
            },
            Op::Transform(t) => self.state.transform = self.state.transform * *t,
            Op::Clip(shape) => self.clip(shape)?,
            Op::Color(c) => self.state.material = Material::Color(*c),
            Op::Image(img) => self.state.material = Material::Image(img.clone()),
            Op::Paint => self.paint()?,
            Op::Text(text) => self.draw_text(text),
            Op::PointerArea(rect) => {
                let dev = rect.bounds_of(&self.state.transform);
                self.state.area = Some(match self.state.area {
                    Some(outer) => outer.intersect(&dev),
                    None => dev,
                });
            }
            Op::PointerInput { tag, kinds } => {
                let rect = self.state.area.unwrap_or_else(|| self.frame_rect());
                self.hit_areas.push(HitArea {
                    tag: *tag,
                    kinds: *kinds,
                    rect,
                });
            }
            Op::Invalidate => self.invalidate = true,
        }
        Ok(())
    }

    fn frame_rect(&self) -> Rect {
        Rect::new(
            Vec2::ZERO,
            vec2(self.pixmap.width() as f32, self.pixmap.height() as f32),
        )
    }

    fn clip(&mut self, shape: &ClipShape) -> crate::Result<()> {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let ts = skia_transform(&self.state.transform);

        let mask = match (shape_path(shape), &self.state.clip) {
            (Some(path), Some(current)) => {
                let mut mask = Mask::clone(current);
                mask.intersect_path(&path, FillRule::Winding, true, ts);
                mask
            }
            (Some(path), None) => {
                let mut mask = Mask::new(w, h).ok_or_else(|| anyhow!("mask {w}x{h}"))?;
                mask.fill_path(&path, FillRule::Winding, true, ts);
                mask
            }
            // Degenerate shapes cover nothing.
            (None, _) => Mask::new(w, h).ok_or_else(|| anyhow!("mask {w}x{h}"))?,
        };
        self.state.clip = Some(Rc::new(mask));
        Ok(())
    }

    fn paint(&mut self) -> crate::Result<()> {
        let mask = self.state.clip.as_deref();
        match &self.state.material {
            Material::Color(c) => {
                let mut paint = Paint::default();
                paint.set_color_rgba8(c.r, c.g, c.b, c.a);
                paint.anti_alias = false;
                let full = tiny_skia::Rect::from_xywh(
                    0.0,
                    0.0,
                    self.pixmap.width() as f32,
                    self.pixmap.height() as f32,
                )
                .ok_or_else(|| anyhow!("invalid frame rect"))?;
                self.pixmap
                    .fill_rect(full, &paint, Transform::identity(), mask);
            }
            Material::Image(img) => {
                let (iw, ih) = img.size();
                let Some(bounds) = tiny_skia::Rect::from_xywh(0.0, 0.0, iw as f32, ih as f32)
                else {
                    return Ok(());
                };
                let paint = Paint {
                    shader: Pattern::new(
                        img.pixmap().as_ref(),
                        SpreadMode::Pad,
                        FilterQuality::Nearest,
                        1.0,
                        Transform::identity(),
                    ),
                    anti_alias: false,
                    ..Paint::default()
                };
                let ts = skia_transform(&self.state.transform);
                self.pixmap.fill_rect(bounds, &paint, ts, mask);
            }
        }
        Ok(())
    }

    fn draw_text(&mut self, op: &TextOp) {
        let ts = skia_transform(&self.state.transform);
        let mask = self.state.clip.as_deref();
        let pixmap = &mut self.pixmap;
        let text = self.text.get_or_insert_with(TextRasterizer::new);

        text.spans(op, |x, y, w, h, color| {
            let Some(r) = tiny_skia::Rect::from_xywh(x as f32, y as f32, w as f32, h as f32)
            else {
                return;
            };
            let mut paint = Paint::default();
            paint.set_color_rgba8(color.r, color.g, color.b, color.a);
            paint.anti_alias = false;
            pixmap.fill_rect(r, &paint, ts, mask);
        });
    }
}

fn skia_transform(t: &Affine2) -> Transform {
    let m = t.matrix2;
    Transform::from_row(
        m.x_axis.x,
        m.x_axis.y,
        m.y_axis.x,
        m.y_axis.y,
        t.translation.x,
        t.translation.y,
    )
}

/// Local-space outline of a clip shape, `None` when it encloses nothing.
fn shape_path(shape: &ClipShape) -> Option<tiny_skia::Path> {
    match shape {
        ClipShape::Rect(r) if r.is_empty() => None,
        ClipShape::Rect(r) => {
            let rect = tiny_skia::Rect::from_ltrb(
                r.min.x as f32,
                r.min.y as f32,
                r.max.x as f32,
                r.max.y as f32,
            )?;
            Some(PathBuilder::from_rect(rect))
        }
        ClipShape::RRect(rr) => rrect_path(rr),
        ClipShape::Circle(c) if c.radius <= 0.0 => None,
        ClipShape::Circle(c) => PathBuilder::from_circle(c.center.x, c.center.y, c.radius),
        ClipShape::Outline(path) => outline_path(path),
    }
}

fn rrect_path(rr: &RRect) -> Option<tiny_skia::Path> {
    if rr.rect.is_empty() {
        return None;
    }
    let [nw, ne, se, sw] = rr.clamped_radii();
    let (min, max) = (rr.rect.min(), rr.rect.max());

    let mut pb = PathBuilder::new();
    pb.move_to(min.x + nw, min.y);
    pb.line_to(max.x - ne, min.y);
    pb.cubic_to(
        max.x - ne + ne * KAPPA,
        min.y,
        max.x,
        min.y + ne - ne * KAPPA,
        max.x,
        min.y + ne,
    );
    pb.line_to(max.x, max.y - se);
    pb.cubic_to(
        max.x,
        max.y - se + se * KAPPA,
        max.x - se + se * KAPPA,
        max.y,
        max.x - se,
        max.y,
    );
    pb.line_to(min.x + sw, max.y);
    pb.cubic_to(
        min.x + sw - sw * KAPPA,
        max.y,
        min.x,
        max.y - sw + sw * KAPPA,
        min.x,
        max.y - sw,
    );
    pb.line_to(min.x, min.y + nw);
    pb.cubic_to(
        min.x,
        min.y + nw - nw * KAPPA,
        min.x + nw - nw * KAPPA,
        min.y,
        min.x + nw,
        min.y,
    );
    pb.close();
    pb.finish()
}

fn outline_path(path: &PathSpec) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    let mut open = false;

    for seg in &path.segments {
        match *seg {
            Segment::MoveTo(p) => {
                if open {
                    pb.close();
                }
                pb.move_to(p.x, p.y);
                open = true;
            }
            Segment::LineTo(p) => {
                if !open {
                    pb.move_to(0.0, 0.0);
                    open = true;
                }
                pb.line_to(p.x, p.y);
            }
            Segment::QuadTo(c, p) => {
                if !open {
                    pb.move_to(0.0, 0.0);
                    open = true;
                }
                pb.quad_to(c.x, c.y, p.x, p.y);
            }
        }
    }
    if open {
        pb.close();
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        op::{Circle, ClipRect, ColorOp, InvalidateOp, Outline, PaintOp, clip::triangle, offset},
        widgets::Label,
        windowing::events::{PointerKinds, Tag},
    };
    use glam::IVec2;
    use std::ops::Range;

    const BG: Color = Color::WHITE;
    const RED: Color = Color::rgb(0x80, 0, 0);
    const GREEN: Color = Color::rgb(0, 0x80, 0);

    fn render(ops: &Ops) -> Frame {
        Rasterizer::new().rasterize(ops, 300, 300, 1.0, BG).unwrap()
    }

    fn rgb(frame: &Frame, x: u32, y: u32) -> Color {
        let p = frame.pixmap.pixel(x, y).unwrap();
        Color::rgba(p.red(), p.green(), p.blue(), p.alpha())
    }

    fn fill_rect(ops: &mut Ops, w: i32, h: i32, color: Color) {
        ColorOp { color }.add(ops);
        ClipRect::new(IVec2::new(w, h)).add(ops);
        PaintOp.add(ops);
    }

    #[test]
    fn unclipped_paint_fills_frame() {
        let mut ops = Ops::new();
        ColorOp { color: RED }.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 0, 0), RED);
        assert_eq!(rgb(&frame, 299, 299), RED);
    }

    #[test]
    fn offset_rect_lands_in_place() {
        let mut ops = Ops::new();
        ops.scoped(|ops| {
            offset(ops, 100.0, 50.0);
            fill_rect(ops, 20, 10, RED);
        });

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 105, 55), RED);
        assert_eq!(rgb(&frame, 119, 59), RED);
        assert_eq!(rgb(&frame, 120, 55), BG);
        assert_eq!(rgb(&frame, 99, 55), BG);
        assert!(frame.hit_areas.is_empty());
        assert!(!frame.invalidate);
    }

    #[test]
    fn load_restores_clip_and_transform() {
        let mut ops = Ops::new();
        ops.scoped(|ops| {
            offset(ops, 200.0, 200.0);
            ClipRect::new(IVec2::new(10, 10)).add(ops);
        });
        ColorOp { color: GREEN }.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 0, 0), GREEN);
        assert_eq!(rgb(&frame, 150, 150), GREEN);
    }

    #[test]
    fn last_color_wins() {
        let mut ops = Ops::new();
        ColorOp { color: RED }.add(&mut ops);
        fill_rect(&mut ops, 10, 10, GREEN);

        assert_eq!(rgb(&render(&ops), 5, 5), GREEN);
    }

    #[test]
    fn empty_clip_paints_nothing() {
        let mut ops = Ops::new();
        fill_rect(&mut ops, 0, 20, RED);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 0, 10), BG);
        assert_eq!(rgb(&frame, 5, 5), BG);
    }

    #[test]
    fn clips_intersect() {
        let mut ops = Ops::new();
        ClipRect::new(IVec2::new(100, 100)).add(&mut ops);
        ClipRect {
            min: IVec2::new(50, 50),
            max: IVec2::new(200, 200),
        }
        .add(&mut ops);
        ColorOp { color: RED }.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 75, 75), RED);
        assert_eq!(rgb(&frame, 25, 25), BG);
        assert_eq!(rgb(&frame, 150, 150), BG);
    }

    #[test]
    fn rounded_corners_are_cut() {
        let mut ops = Ops::new();
        RRect::uniform(Rect::new(vec2(100.0, 100.0), vec2(100.0, 100.0)), 15.0).add(&mut ops);
        ColorOp { color: RED }.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 100, 100), BG);
        assert_eq!(rgb(&frame, 199, 199), BG);
        assert_eq!(rgb(&frame, 150, 101), RED);
        assert_eq!(rgb(&frame, 105, 110), RED);
    }

    #[test]
    fn triangle_outline() {
        let mut ops = Ops::new();
        offset(&mut ops, 100.0, 100.0);
        Outline {
            path: triangle(100.0),
        }
        .add(&mut ops);
        ColorOp { color: GREEN }.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 150, 190), GREEN);
        assert_eq!(rgb(&frame, 150, 120), GREEN);
        assert_eq!(rgb(&frame, 105, 110), BG);
        assert_eq!(rgb(&frame, 195, 110), BG);
    }

    #[test]
    fn circle_clip() {
        let mut ops = Ops::new();
        Circle {
            center: vec2(100.0, 100.0),
            radius: 50.0,
        }
        .add(&mut ops);
        ColorOp { color: RED }.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 100, 100), RED);
        assert_eq!(rgb(&frame, 100, 60), RED);
        assert_eq!(rgb(&frame, 60, 60), BG);
    }

    #[test]
    fn image_covers_only_its_bounds() {
        let mut img = image::RgbaImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = image::Rgba([10, 20, 30, 255]);
        }
        let image = ImageOp::new(&img).unwrap();

        let mut ops = Ops::new();
        offset(&mut ops, 10.0, 10.0);
        image.add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert_eq!(rgb(&frame, 10, 10), Color::rgb(10, 20, 30));
        assert_eq!(rgb(&frame, 13, 13), Color::rgb(10, 20, 30));
        assert_eq!(rgb(&frame, 14, 14), BG);
        assert_eq!(rgb(&frame, 9, 9), BG);
    }

    #[test]
    fn pointer_areas_follow_transform_and_scale() {
        let tag = Tag::new();
        let mut ops = Ops::new();
        offset(&mut ops, 350.0, 300.0);
        ops.push(Op::PointerArea(Rect::new(Vec2::ZERO, vec2(100.0, 100.0))));
        ops.push(Op::PointerInput {
            tag,
            kinds: PointerKinds::PRESS | PointerKinds::RELEASE,
        });

        let frame = Rasterizer::new()
            .rasterize(&ops, 1000, 1000, 2.0, BG)
            .unwrap();
        assert_eq!(frame.hit_areas.len(), 1);
        let hit = frame.hit_areas[0];
        assert_eq!(hit.tag, tag);
        assert_eq!(hit.rect, Rect::new(vec2(700.0, 600.0), vec2(200.0, 200.0)));
    }

    #[test]
    fn input_without_area_covers_frame() {
        let tag = Tag::new();
        let mut ops = Ops::new();
        ops.push(Op::PointerInput {
            tag,
            kinds: PointerKinds::MOVE,
        });

        let frame = render(&ops);
        assert_eq!(frame.hit_areas[0].rect, Rect::new(Vec2::ZERO, vec2(300.0, 300.0)));
    }

    #[test]
    fn invalidate_is_reported() {
        let mut ops = Ops::new();
        InvalidateOp.add(&mut ops);
        assert!(render(&ops).invalidate);
    }

    const LABEL: Color = Color::rgb(145, 50, 168);

    /// Glyph coverage blends the label color over white, which keeps red and
    /// blue above green.
    fn is_label_ink(c: Color) -> bool {
        c != BG && c.r > c.g && c.b > c.g && c.b >= c.r
    }

    fn inked_columns(frame: &Frame, xs: Range<u32>, ys: Range<u32>) -> Vec<u32> {
        xs.filter(|&x| ys.clone().any(|y| is_label_ink(rgb(frame, x, y))))
            .collect()
    }

    #[test]
    fn label_draws_in_its_color_and_keeps_material() {
        if !TextRasterizer::new().has_fonts() {
            return;
        }

        let mut ops = Ops::new();
        ColorOp { color: RED }.add(&mut ops);
        ops.scoped(|ops| {
            offset(ops, 10.0, 10.0);
            Label::body2("Click me").color(LABEL).layout(ops);
        });
        ClipRect {
            min: IVec2::new(0, 250),
            max: IVec2::new(300, 300),
        }
        .add(&mut ops);
        PaintOp.add(&mut ops);

        let frame = render(&ops);
        assert!(!inked_columns(&frame, 10..150, 10..40).is_empty());
        assert!(inked_columns(&frame, 0..300, 40..250).is_empty());
        assert_eq!(rgb(&frame, 150, 275), RED);
        assert_eq!(rgb(&frame, 150, 200), BG);
    }

    #[test]
    fn clip_cuts_text_off() {
        if !TextRasterizer::new().has_fonts() {
            return;
        }

        let mut ops = Ops::new();
        ClipRect::new(IVec2::new(30, 300)).add(&mut ops);
        offset(&mut ops, 10.0, 10.0);
        Label::body2("Click me").color(LABEL).layout(&mut ops);

        let frame = render(&ops);
        assert!(!inked_columns(&frame, 0..30, 10..40).is_empty());
        assert!(inked_columns(&frame, 30..300, 0..300).is_empty());
    }

    #[test]
    fn zero_sized_frame_is_an_error() {
        assert!(Rasterizer::new().rasterize(&Ops::new(), 0, 10, 1.0, BG).is_err());
    }
}
