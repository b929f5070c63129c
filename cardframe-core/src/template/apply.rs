use crate::{
    assets::palette::unique_colors,
    assets::store::{AssetCache, AssetSource, PreparedAsset},
    foundation::core::{CardSpec, Layout, Origin, Point, Size, to_px},
    foundation::error::{CardError, CardResult},
    foundation::math::{scale_to_cover, scale_to_fit},
    scene::canvas::CardCanvas,
    scene::layer::Layer,
    template::model::{ArtWindow, Template, TemplateLayer},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Overlay,
    Background,
}

/// Apply `template` to every canvas and return the distinct colours of its vector assets.
///
/// Overlay and background assets are loaded once through `cache` (concurrently on first use).
/// Each canvas is resized to the template orientation, the assets are scaled to cover their
/// layer boxes and centred on the card, the photo is fitted into the overlay's art window,
/// and the card clip is rotated to match the orientation.
///
/// Returned colours are lowercase `#rrggbb`, overlay colours first, without duplicates.
#[tracing::instrument(skip_all, fields(template = %template.name, canvases = canvases.len()))]
pub fn apply_template(
    canvases: &mut [CardCanvas],
    template: &Template,
    cache: &AssetCache,
    assets: &dyn AssetSource,
) -> CardResult<Vec<String>> {
    template.validate()?;
    if let Some(i) = canvases.iter().position(|c| c.main_image().is_none()) {
        return Err(CardError::validation(format!(
            "canvas {i} has no photo to apply a template to"
        )));
    }

    let (overlay_asset, background_asset) = cache.load_pair(
        assets,
        template.overlay.as_ref().map(|l| (l.kind(), l.source.as_str())),
        template.background.as_ref().map(|l| (l.kind(), l.source.as_str())),
    )?;
    let shadow = template.parsed_shadow()?;

    for canvas in canvases.iter_mut() {
        let card = canvas.card;
        let target = template.layout.canvas_size(&card);
        let (w, h) = (to_px(target.width), to_px(target.height));
        if (w, h) != (canvas.width, canvas.height) {
            tracing::debug!(
                from_w = canvas.width,
                from_h = canvas.height,
                to_w = w,
                to_h = h,
                "resizing canvas"
            );
            canvas.set_dimensions(w, h);
        }

        if let Some(main) = canvas.main_image_mut() {
            main.shadow = shadow;
        }

        // Rotated first so a background falling back to the card shape matches the clip.
        if let Some(clip) = canvas.clip_path.as_mut() {
            clip.angle_deg = template.layout.clip_angle_deg();
            reposition(clip, template.layout, &card);
        }

        let slots = [
            (Slot::Overlay, template.overlay.as_ref(), overlay_asset.as_ref()),
            (
                Slot::Background,
                template.background.as_ref(),
                background_asset.as_ref(),
            ),
        ];
        for (slot, entry, asset) in slots {
            match (entry, asset) {
                (Some(entry), Some(asset)) => {
                    let layer = place_template_layer(asset, entry, template.layout, &card)?;
                    match slot {
                        Slot::Overlay => {
                            if let Some(main) = canvas.main_image_mut() {
                                scale_image_to_overlay_area(entry.window(), &layer, main)?;
                            }
                            canvas.overlay = Some(layer);
                        }
                        Slot::Background => canvas.background = Some(layer),
                    }
                }
                _ => match slot {
                    Slot::Overlay => {
                        reset_without_overlay(canvas, target, template.layout, &card)?;
                    }
                    Slot::Background => {
                        canvas.background = canvas.clip_path.clone();
                    }
                },
            }
        }
    }

    let swatches = overlay_asset
        .iter()
        .chain(background_asset.iter())
        .flat_map(PreparedAsset::swatches);
    let colors = unique_colors(swatches);
    tracing::debug!(colors = colors.len(), "template applied");
    Ok(colors)
}

/// Fit `photo` inside `window` of an already placed overlay layer and centre it there.
///
/// A photo rotated by an odd multiple of 90 degrees is fitted with its sides swapped.
pub fn scale_image_to_overlay_area(
    window: ArtWindow,
    overlay: &Layer,
    photo: &mut Layer,
) -> CardResult<()> {
    let overlay_size = overlay.transformed_size();
    let photo_size = if photo.is_rotated() {
        Size::new(photo.height, photo.width)
    } else {
        photo.size()
    };
    let area = Size::new(
        overlay_size.width * window.width,
        overlay_size.height * window.height,
    );
    let scale = scale_to_fit(photo_size, area)?;
    photo.set_scale(scale);

    let top_left = overlay.point_at(Origin::TopLeft);
    let center = Point::new(
        overlay_size.width * (window.x + window.width / 2.0) + top_left.x,
        overlay_size.height * (window.y + window.height / 2.0) + top_left.y,
    );
    photo.set_position_by_origin(center, Origin::Center);
    Ok(())
}

/// Build a layer from a template asset, scaled to cover its box and centred on the card.
///
/// Vector assets are cover-scaled like raster ones instead of keeping their intrinsic size, so
/// an SVG drawn at any viewport size fills the same box.
fn place_template_layer(
    asset: &PreparedAsset,
    entry: &TemplateLayer,
    layout: Layout,
    card: &CardSpec,
) -> CardResult<Layer> {
    let mut layer = Layer::from_asset(asset.clone());
    let scale = scale_to_cover(
        layer.size(),
        Size::new(entry.layer_width, entry.layer_height),
    )?;
    layer.set_scale(scale);
    reposition(&mut layer, layout, card);
    Ok(layer)
}

/// Without an overlay the photo goes back to covering the whole card.
fn reset_without_overlay(
    canvas: &mut CardCanvas,
    target: Size,
    layout: Layout,
    card: &CardSpec,
) -> CardResult<()> {
    canvas.overlay = None;
    if let Some(main) = canvas.main_image_mut() {
        let scale = scale_to_cover(main.size(), target)?;
        main.set_scale(scale);
        main.center = layout.card_center(card);
    }
    Ok(())
}

fn reposition(layer: &mut Layer, layout: Layout, card: &CardSpec) {
    layer.center = layout.card_center(card);
}

#[cfg(test)]
#[path = "../../tests/unit/template/apply.rs"]
mod tests;
