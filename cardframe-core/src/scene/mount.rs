use std::path::Path;

use crate::{
    assets::decode::{decode_image, decode_image_file},
    assets::store::PreparedImage,
    foundation::core::CardSpec,
    foundation::error::CardResult,
    foundation::math::scale_to_cover,
    scene::canvas::CardCanvas,
    scene::layer::Layer,
};

/// Create a card canvas holding `photo`.
///
/// The rounded card rectangle is centred and used both as the clip path and as the
/// background. The photo is scaled to cover the whole canvas and centred.
#[tracing::instrument(skip(photo, card), fields(photo_w = photo.width, photo_h = photo.height))]
pub fn mount_photo(photo: PreparedImage, card: &CardSpec) -> CardResult<CardCanvas> {
    card.validate()?;
    let (width, height) = card.pixel_size();
    let mut canvas = CardCanvas::new(width, height, *card);

    let mut border = Layer::card_rect(card);
    canvas.center_object(&mut border);
    canvas.clip_path = Some(border.clone());
    canvas.background = Some(border);

    let mut image = Layer::image(photo);
    let scale = scale_to_cover(image.size(), canvas.size())?;
    image.set_scale(scale);
    canvas.center_object(&mut image);
    tracing::debug!(scale, "photo mounted");
    canvas.add(image);

    Ok(canvas)
}

/// Decode encoded image bytes and mount them.
pub fn mount_photo_bytes(bytes: &[u8], card: &CardSpec) -> CardResult<CardCanvas> {
    mount_photo(decode_image(bytes)?, card)
}

/// Read, decode and mount an image file.
pub fn mount_photo_file(path: &Path, card: &CardSpec) -> CardResult<CardCanvas> {
    mount_photo(decode_image_file(path)?, card)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/mount.rs"]
mod tests;
