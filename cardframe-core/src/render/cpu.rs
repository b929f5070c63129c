use resvg::tiny_skia as sk;

use crate::{
    foundation::core::{Affine, Vec2},
    foundation::error::{CardError, CardResult},
    foundation::math::mul_div255_u8,
    render::blur::{blur_params, blur_rgba8_premul},
    render::frame::{FrameRGBA, RenderSettings},
    scene::canvas::CardCanvas,
    scene::layer::{Layer, LayerSource, RectShape},
    scene::shadow::Shadow,
};

/// Rasterize a canvas.
///
/// Background and objects are painted into a group that is clipped by the canvas clip path;
/// the overlay is painted last, unclipped.
#[tracing::instrument(skip_all, fields(w = canvas.width, h = canvas.height))]
pub fn render_canvas(canvas: &CardCanvas, settings: &RenderSettings) -> CardResult<FrameRGBA> {
    let (w, h) = (canvas.width, canvas.height);
    let mut out = new_pixmap(w, h)?;
    if let Some([r, g, b, a]) = settings.clear_rgba {
        out.fill(sk::Color::from_rgba8(r, g, b, a));
    }

    let mut group = new_pixmap(w, h)?;
    if let Some(bg) = &canvas.background {
        draw_layer(&mut group, bg, Affine::IDENTITY)?;
    }
    for obj in &canvas.objects {
        if let Some(shadow) = obj.shadow {
            draw_shadow(&mut group, obj, shadow)?;
        }
        draw_layer(&mut group, obj, Affine::IDENTITY)?;
    }
    if let Some(clip) = &canvas.clip_path {
        let mut silhouette = new_pixmap(w, h)?;
        paint_layer(&mut silhouette, clip, Affine::IDENTITY)?;
        let mask = sk::Mask::from_pixmap(silhouette.as_ref(), sk::MaskType::Alpha);
        group.apply_mask(&mask);
    }
    out.draw_pixmap(
        0,
        0,
        group.as_ref(),
        &sk::PixmapPaint::default(),
        sk::Transform::identity(),
        None,
    );

    if let Some(overlay) = &canvas.overlay {
        draw_layer(&mut out, overlay, Affine::IDENTITY)?;
    }

    Ok(FrameRGBA {
        width: w,
        height: h,
        data: out.take(),
        premultiplied: true,
    })
}

fn new_pixmap(w: u32, h: u32) -> CardResult<sk::Pixmap> {
    sk::Pixmap::new(w, h)
        .ok_or_else(|| CardError::render(format!("cannot allocate {w}x{h} pixmap")))
}

/// Paint `layer` honouring its opacity.
fn draw_layer(dst: &mut sk::Pixmap, layer: &Layer, extra: Affine) -> CardResult<()> {
    let opacity = layer.opacity.clamp(0.0, 1.0) as f32;
    if opacity <= 0.0 {
        return Ok(());
    }
    if opacity >= 1.0 {
        return paint_layer(dst, layer, extra);
    }
    let mut tmp = new_pixmap(dst.width(), dst.height())?;
    paint_layer(&mut tmp, layer, extra)?;
    dst.draw_pixmap(
        0,
        0,
        tmp.as_ref(),
        &sk::PixmapPaint {
            opacity,
            ..sk::PixmapPaint::default()
        },
        sk::Transform::identity(),
        None,
    );
    Ok(())
}

/// Paint `layer` at full opacity with `extra` applied after the layer transform.
fn paint_layer(dst: &mut sk::Pixmap, layer: &Layer, extra: Affine) -> CardResult<()> {
    let transform = to_sk(extra * layer.affine());
    match &layer.source {
        LayerSource::Image(img) => {
            let size = sk::IntSize::from_wh(img.width, img.height)
                .ok_or_else(|| CardError::render("image layer has zero size"))?;
            let src = sk::Pixmap::from_vec(img.rgba8_premul.as_ref().clone(), size)
                .ok_or_else(|| CardError::render("image layer buffer does not match its size"))?;
            dst.draw_pixmap(
                0,
                0,
                src.as_ref(),
                &sk::PixmapPaint {
                    quality: sk::FilterQuality::Bilinear,
                    ..sk::PixmapPaint::default()
                },
                transform,
                None,
            );
        }
        LayerSource::Svg(svg) => {
            resvg::render(&svg.tree, transform, &mut dst.as_mut());
        }
        LayerSource::Rect(shape) => {
            let path = rounded_rect_path(layer.width, layer.height, shape)?;
            let mut paint = sk::Paint::default();
            let [r, g, b, a] = shape.fill.to_rgba8();
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;
            dst.fill_path(&path, &paint, sk::FillRule::Winding, transform, None);
        }
    }
    Ok(())
}

/// Paint the tinted, blurred, offset silhouette of `layer`.
fn draw_shadow(dst: &mut sk::Pixmap, layer: &Layer, shadow: Shadow) -> CardResult<()> {
    let (sx, sy, sb) = if shadow.non_scaling {
        (1.0, 1.0, 1.0)
    } else {
        (layer.scale_x, layer.scale_y, layer.scale_x.max(layer.scale_y))
    };
    let offset = Affine::translate(Vec2::new(shadow.offset_x * sx, shadow.offset_y * sy));

    let mut silhouette = new_pixmap(dst.width(), dst.height())?;
    paint_layer(&mut silhouette, layer, offset)?;

    let [cr, cg, cb, ca] = shadow.color.to_rgba8();
    for px in silhouette.data_mut().chunks_exact_mut(4) {
        let a = mul_div255_u8(u16::from(px[3]), u16::from(ca));
        px[0] = mul_div255_u8(u16::from(cr), u16::from(a));
        px[1] = mul_div255_u8(u16::from(cg), u16::from(a));
        px[2] = mul_div255_u8(u16::from(cb), u16::from(a));
        px[3] = a;
    }

    let max_radius = silhouette.width().max(silhouette.height());
    if let Some((radius, sigma)) = blur_params(shadow.blur * sb, max_radius) {
        let blurred = blur_rgba8_premul(
            silhouette.data(),
            silhouette.width(),
            silhouette.height(),
            radius,
            sigma,
        )?;
        silhouette.data_mut().copy_from_slice(&blurred);
    }

    dst.draw_pixmap(
        0,
        0,
        silhouette.as_ref(),
        &sk::PixmapPaint {
            opacity: layer.opacity.clamp(0.0, 1.0) as f32,
            ..sk::PixmapPaint::default()
        },
        sk::Transform::identity(),
        None,
    );
    Ok(())
}

fn rounded_rect_path(w: f64, h: f64, shape: &RectShape) -> CardResult<sk::Path> {
    use kurbo::{PathEl, Shape};

    let radius = shape.corner_radius.clamp(0.0, w.min(h) / 2.0);
    let rect = kurbo::RoundedRect::new(0.0, 0.0, w, h, radius);
    let mut pb = sk::PathBuilder::new();
    for el in rect.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32);
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
        .ok_or_else(|| CardError::render("card rectangle produced an empty path"))
}

fn to_sk(a: Affine) -> sk::Transform {
    let [a, b, c, d, e, f] = a.as_coeffs();
    sk::Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
