use std::{collections::BTreeMap, path::Path};

use anyhow::Context;

use crate::{
    assets::store::AssetKind,
    foundation::core::Layout,
    foundation::error::{CardError, CardResult},
    scene::shadow::Shadow,
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// A decorative template applied over a mounted photo.
pub struct Template {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Artwork drawn above the photo, outside the card clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<TemplateLayer>,
    /// Artwork drawn beneath the photo, inside the card clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<TemplateLayer>,
    /// CSS-like drop shadow for the photo, e.g. `"rgba(0,0,0,0.4) 4px 4px 12px"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<String>,
    /// Orientation of the card.
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One template asset plus the box it is scaled to cover.
pub struct TemplateLayer {
    /// Asset path, relative to the template's asset root.
    #[serde(alias = "url")]
    pub source: String,
    /// Force vector/raster interpretation; inferred from the extension when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_svg: Option<bool>,
    /// Width of the box the asset is scaled to cover.
    pub layer_width: f64,
    /// Height of the box the asset is scaled to cover.
    pub layer_height: f64,
    /// Region of an overlay reserved for the photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_window: Option<ArtWindow>,
}

impl TemplateLayer {
    /// Whether the asset is parsed as SVG.
    pub fn kind(&self) -> AssetKind {
        let is_svg = self.is_svg.unwrap_or_else(|| {
            Path::new(&self.source)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
        });
        if is_svg {
            AssetKind::Svg
        } else {
            AssetKind::Image
        }
    }

    /// The art window, or the whole layer when none is set.
    pub fn window(&self) -> ArtWindow {
        self.art_window.unwrap_or_default()
    }

    fn validate(&self, what: &str) -> CardResult<()> {
        if self.source.trim().is_empty() {
            return Err(CardError::validation(format!("{what} source is empty")));
        }
        if !(self.layer_width.is_finite() && self.layer_height.is_finite())
            || self.layer_width <= 0.0
            || self.layer_height <= 0.0
        {
            return Err(CardError::validation(format!(
                "{what} layer_width/layer_height must be > 0"
            )));
        }
        if let Some(w) = self.art_window {
            w.validate(what)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Photo region of an overlay, as fractions of the overlay's scaled size.
pub struct ArtWindow {
    /// Left edge fraction.
    pub x: f64,
    /// Top edge fraction.
    pub y: f64,
    /// Width fraction.
    pub width: f64,
    /// Height fraction.
    pub height: f64,
}

impl Default for ArtWindow {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl ArtWindow {
    fn validate(&self, what: &str) -> CardResult<()> {
        let all_finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(CardError::validation(format!(
                "{what} art_window must be finite with width/height > 0"
            )));
        }
        Ok(())
    }
}

impl Template {
    /// Check asset boxes, art window and shadow syntax.
    pub fn validate(&self) -> CardResult<()> {
        if let Some(o) = &self.overlay {
            o.validate("overlay")?;
        }
        if let Some(b) = &self.background {
            b.validate("background")?;
        }
        self.parsed_shadow()?;
        Ok(())
    }

    /// The template shadow, always non-scaling.
    pub fn parsed_shadow(&self) -> CardResult<Option<Shadow>> {
        self.shadow
            .as_deref()
            .map(|s| Shadow::parse(s).map(Shadow::non_scaling))
            .transpose()
    }

    /// Parse and validate a template from JSON text.
    pub fn from_json_str(s: &str) -> CardResult<Self> {
        let t: Self = serde_json::from_str(s)?;
        t.validate()?;
        Ok(t)
    }

    /// Read and parse a template JSON file.
    pub fn from_path(path: &Path) -> CardResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read template '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Named templates, keyed by a stable template key.
pub struct TemplateCatalog {
    templates: BTreeMap<String, Template>,
}

impl TemplateCatalog {
    /// Parse and validate every template in a JSON object.
    pub fn from_json_str(s: &str) -> CardResult<Self> {
        let catalog: Self = serde_json::from_str(s)?;
        for (key, t) in &catalog.templates {
            t.validate()
                .map_err(|e| CardError::validation(format!("template '{key}': {e}")))?;
        }
        Ok(catalog)
    }

    /// Read and parse a catalog JSON file.
    pub fn from_path(path: &Path) -> CardResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Look up a template by key.
    pub fn get(&self, key: &str) -> CardResult<&Template> {
        self.templates
            .get(key)
            .ok_or_else(|| CardError::validation(format!("unknown template '{key}'")))
    }

    /// Template keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Add or replace a template.
    pub fn insert(&mut self, key: impl Into<String>, template: Template) {
        self.templates.insert(key.into(), template);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
