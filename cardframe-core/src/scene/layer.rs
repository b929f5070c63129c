use crate::{
    assets::store::{PreparedAsset, PreparedImage, PreparedSvg},
    foundation::color::Rgba,
    foundation::core::{Affine, CardSpec, Origin, Point, Rect, Size, Vec2},
    scene::shadow::Shadow,
};

/// Rounded rectangle drawn with a solid fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectShape {
    /// Corner radius in local units.
    pub corner_radius: f64,
    /// Fill colour.
    pub fill: Rgba,
}

/// What a [`Layer`] draws.
#[derive(Clone, Debug)]
pub enum LayerSource {
    /// Raster bitmap.
    Image(PreparedImage),
    /// Vector artwork.
    Svg(PreparedSvg),
    /// Solid rounded rectangle.
    Rect(RectShape),
}

/// One placed visual on a canvas.
///
/// Layers are positioned by their centre. Local coordinates span `[0, width] x [0, height]`
/// and map to the canvas through scale, then rotation about the centre, then translation.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Drawn content.
    pub source: LayerSource,
    /// Intrinsic width.
    pub width: f64,
    /// Intrinsic height.
    pub height: f64,
    /// Canvas-space centre.
    pub center: Point,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Clockwise rotation in degrees.
    pub angle_deg: f64,
    /// Opacity in `0..=1`.
    pub opacity: f64,
    /// Optional drop shadow.
    pub shadow: Option<Shadow>,
}

impl Layer {
    fn with_source(source: LayerSource, size: Size) -> Self {
        Self {
            source,
            width: size.width,
            height: size.height,
            center: Point::ZERO,
            scale_x: 1.0,
            scale_y: 1.0,
            angle_deg: 0.0,
            opacity: 1.0,
            shadow: None,
        }
    }

    /// Raster layer at intrinsic size.
    pub fn image(img: PreparedImage) -> Self {
        let size = img.size();
        Self::with_source(LayerSource::Image(img), size)
    }

    /// Vector layer at intrinsic size.
    pub fn svg(svg: PreparedSvg) -> Self {
        let size = svg.size();
        Self::with_source(LayerSource::Svg(svg), size)
    }

    /// Layer for any prepared template asset.
    pub fn from_asset(asset: PreparedAsset) -> Self {
        match asset {
            PreparedAsset::Image(i) => Self::image(i),
            PreparedAsset::Svg(s) => Self::svg(s),
        }
    }

    /// The rounded card rectangle in landscape orientation.
    pub fn card_rect(card: &CardSpec) -> Self {
        Self::with_source(
            LayerSource::Rect(RectShape {
                corner_radius: card.corner_radius,
                fill: card.fill,
            }),
            card.size(),
        )
    }

    /// Whether this layer draws a raster bitmap.
    pub fn is_image(&self) -> bool {
        matches!(self.source, LayerSource::Image(_))
    }

    /// Intrinsic size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Size after scaling; rotation is not applied.
    pub fn transformed_size(&self) -> Size {
        Size::new(self.width * self.scale_x, self.height * self.scale_y)
    }

    /// Apply the same scale on both axes.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale_x = scale;
        self.scale_y = scale;
    }

    /// True unless the rotation is a multiple of 180 degrees.
    pub fn is_rotated(&self) -> bool {
        let r = self.angle_deg.rem_euclid(180.0);
        r > 1e-9 && (180.0 - r) > 1e-9
    }

    /// Local-to-canvas transform.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.center.to_vec2())
            * Affine::rotate(self.angle_deg.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(Vec2::new(-self.width / 2.0, -self.height / 2.0))
    }

    /// Canvas-space position of the local top-left corner.
    pub fn top_left(&self) -> Point {
        self.affine() * Point::ZERO
    }

    /// Canvas-space position of `origin`.
    pub fn point_at(&self, origin: Origin) -> Point {
        match origin {
            Origin::Center => self.center,
            Origin::TopLeft => self.top_left(),
        }
    }

    /// Move the layer so that `origin` lands on `point`.
    pub fn set_position_by_origin(&mut self, point: Point, origin: Origin) {
        let delta = point - self.point_at(origin);
        self.center += delta;
    }

    /// Transformed corners: top-left, top-right, bottom-right, bottom-left.
    pub fn coords(&self) -> [Point; 4] {
        let a = self.affine();
        [
            a * Point::new(0.0, 0.0),
            a * Point::new(self.width, 0.0),
            a * Point::new(self.width, self.height),
            a * Point::new(0.0, self.height),
        ]
    }

    /// Axis-aligned canvas-space bounds.
    pub fn bounding_rect(&self) -> Rect {
        let c = self.coords();
        c[1..]
            .iter()
            .fold(Rect::from_points(c[0], c[0]), |r, p| r.union_pt(*p))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layer.rs"]
mod tests;
