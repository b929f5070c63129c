use std::sync::Arc;

use crate::{
    assets::store::PreparedSvg,
    foundation::color::Rgba,
    foundation::error::{CardError, CardResult},
};

/// Which paint slot of a vector path a swatch was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintTarget {
    /// Stroke paint.
    Stroke,
    /// Fill paint.
    Fill,
}

/// One solid paint found in a vector asset, normalized to `#rrggbb` plus a separate opacity.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Swatch {
    /// Paint slot the colour came from.
    pub target: PaintTarget,
    /// Lowercase `#rrggbb`.
    pub hex: String,
    /// Paint opacity in `0..=1`.
    pub opacity: f32,
}

/// Collect every solid stroke/fill paint in document order.
///
/// Gradients, patterns and fully transparent paints are skipped.
pub fn extract_palette(tree: &usvg::Tree) -> Vec<Swatch> {
    let mut out = Vec::new();
    collect_group(tree.root(), &mut out);
    out
}

/// Distinct hex values of `swatches`, first-seen order.
pub fn unique_colors<'a>(swatches: impl IntoIterator<Item = &'a Swatch>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in swatches {
        if !out.iter().any(|c| c == &s.hex) {
            out.push(s.hex.clone());
        }
    }
    out
}

fn collect_group(group: &usvg::Group, out: &mut Vec<Swatch>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => collect_group(g, out),
            usvg::Node::Path(p) => {
                if let Some(stroke) = p.stroke() {
                    push_paint(PaintTarget::Stroke, stroke.paint(), stroke.opacity(), out);
                }
                if let Some(fill) = p.fill() {
                    push_paint(PaintTarget::Fill, fill.paint(), fill.opacity(), out);
                }
            }
            usvg::Node::Text(t) => collect_group(t.flattened(), out),
            usvg::Node::Image(_) => {}
        }
    }
}

fn push_paint(
    target: PaintTarget,
    paint: &usvg::Paint,
    opacity: usvg::Opacity,
    out: &mut Vec<Swatch>,
) {
    let usvg::Paint::Color(c) = paint else {
        return;
    };
    let opacity = opacity.get();
    if opacity <= 0.0 {
        return;
    }
    out.push(Swatch {
        target,
        hex: Rgba::from_rgba8(c.red, c.green, c.blue, 255).to_hex(),
        opacity,
    });
}

/// Replace every solid fill/stroke colour equal to `from` with `to` and re-parse the asset.
///
/// Gradient stops keep their colours.
///
/// The tree is re-emitted through the `usvg` writer first, so colours are already in
/// normalized `#rrggbb` form no matter how the source spelled them.
pub fn recolor_svg(svg: &PreparedSvg, from: &str, to: &str) -> CardResult<PreparedSvg> {
    let from = Rgba::parse(from)?.to_hex();
    let to = Rgba::parse(to)?.to_hex();

    let xml = svg.tree.to_string(&usvg::WriteOptions::default());
    let recolored = replace_paint_attrs(&xml, &from, &to);

    let tree = usvg::Tree::from_str(&recolored, &crate::assets::decode::svg_options(None))
        .map_err(|e| CardError::asset(format!("re-parse recolored svg: {e}")))?;
    let swatches = extract_palette(&tree);
    Ok(PreparedSvg {
        tree: Arc::new(tree),
        swatches: Arc::new(swatches),
    })
}

const PAINT_ATTRS: [&str; 2] = ["fill=\"", "stroke=\""];

/// Rewrite `fill`/`stroke` attribute values equal (case-insensitively) to `from`.
///
/// Other attributes, gradient `stop-color` included, are left alone.
fn replace_paint_attrs(xml: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(value_start) = next_paint_value(rest) {
        out.push_str(&rest[..value_start]);
        rest = &rest[value_start..];
        let value_len = rest.find('"').unwrap_or(rest.len());
        let value = &rest[..value_len];
        out.push_str(if value.eq_ignore_ascii_case(from) {
            to
        } else {
            value
        });
        rest = &rest[value_len..];
    }
    out.push_str(rest);
    out
}

/// Byte offset of the first paint attribute value in `xml`.
fn next_paint_value(xml: &str) -> Option<usize> {
    PAINT_ATTRS
        .iter()
        .filter_map(|attr| find_attr(xml, attr).map(|at| at + attr.len()))
        .min()
}

/// Position of `attr` where it starts a whole attribute name.
fn find_attr(xml: &str, attr: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = xml[from..].find(attr) {
        let at = from + i;
        if at > 0 && xml.as_bytes()[at - 1].is_ascii_whitespace() {
            return Some(at);
        }
        from = at + attr.len();
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/assets/palette.rs"]
mod tests;
