use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use anyhow::Context;

use crate::{
    assets::palette::extract_palette,
    assets::store::{PreparedImage, PreparedSvg},
    foundation::error::{CardError, CardResult},
};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CardResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| CardError::asset(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CardError::asset("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Read and decode an image file.
pub fn decode_image_file(path: &Path) -> CardResult<PreparedImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))
        .map_err(|e| CardError::asset(format!("{e:#}")))?;
    decode_image(&bytes)
}

/// Parse SVG bytes into a prepared `usvg` tree and collect its normalized palette.
pub fn parse_svg(bytes: &[u8]) -> CardResult<PreparedSvg> {
    parse_svg_in(bytes, None)
}

pub(crate) fn parse_svg_in(bytes: &[u8], resources_dir: Option<PathBuf>) -> CardResult<PreparedSvg> {
    let opts = svg_options(resources_dir);
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| CardError::asset(format!("parse svg tree: {e}")))?;
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(CardError::asset("svg has invalid width/height"));
    }
    let swatches = extract_palette(&tree);
    Ok(PreparedSvg {
        tree: Arc::new(tree),
        swatches: Arc::new(swatches),
    })
}

pub(crate) fn svg_options(resources_dir: Option<PathBuf>) -> usvg::Options<'static> {
    usvg::Options {
        resources_dir,
        fontdb: shared_fontdb(),
        ..Default::default()
    }
}

/// System fonts are loaded once per process; template text is flattened with them.
fn shared_fontdb() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts for svg text");
        Arc::new(db)
    })
    .clone()
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
