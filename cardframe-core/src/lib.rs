//! Cardframe composes a user photo into a fixed-aspect card and decorates it with templates.
//!
//! # Pipeline overview
//!
//! 1. **Mount**: `PreparedImage -> CardCanvas` ([`mount_photo`]): the photo is scaled to cover
//!    a rounded card that clips everything beneath the overlay.
//! 2. **Apply**: `CardCanvas[] + Template -> palette` ([`apply_template`]): overlay and
//!    background artwork (SVG or raster) are loaded once through an [`AssetCache`], scaled to
//!    cover their boxes, centred on the card, and the photo is fitted into the overlay's
//!    [`ArtWindow`]. Switching [`Layout`] rotates the card clip and resizes the canvas.
//! 3. **Render**: `CardCanvas -> FrameRGBA` ([`render_canvas`]).
//!
//! The palette returned by [`apply_template`] lists the distinct solid colours of the vector
//! assets, normalized to `#rrggbb`; [`recolor_svg`] swaps one of them for theming.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod render;
mod scene;
mod template;

pub use assets::decode::{decode_image, decode_image_file, parse_svg};
pub use assets::palette::{PaintTarget, Swatch, extract_palette, recolor_svg, unique_colors};
pub use assets::store::{
    AssetCache, AssetId, AssetKind, AssetSource, FsSource, MemorySource, PreparedAsset,
    PreparedImage, PreparedSvg, normalize_rel_path,
};
pub use foundation::color::Rgba;
pub use foundation::core::{Affine, CardSpec, Layout, Origin, Point, Rect, Size, Vec2};
pub use foundation::error::{CardError, CardResult};
pub use foundation::math::{scale_to_cover, scale_to_fit};
pub use render::blur::blur_rgba8_premul;
pub use render::cpu::render_canvas;
pub use render::frame::{FrameRGBA, RenderSettings};
pub use scene::canvas::CardCanvas;
pub use scene::layer::{Layer, LayerSource, RectShape};
pub use scene::mount::{mount_photo, mount_photo_bytes, mount_photo_file};
pub use scene::shadow::Shadow;
pub use template::apply::{apply_template, scale_image_to_overlay_area};
pub use template::model::{ArtWindow, Template, TemplateCatalog, TemplateLayer};
