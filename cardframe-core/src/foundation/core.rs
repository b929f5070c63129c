use crate::foundation::color::Rgba;
use crate::foundation::error::{CardError, CardResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Geometry of the physical card a photo is framed in.
///
/// Dimensions are expressed in landscape orientation; [`Layout`] decides whether a
/// canvas uses them as-is or swapped.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardSpec {
    /// Card width in pixels (landscape).
    pub width: f64,
    /// Card height in pixels (landscape).
    pub height: f64,
    /// Corner radius of the card clip in pixels.
    #[serde(default = "default_corner_radius")]
    pub corner_radius: f64,
    /// Card colour shown where no template background covers it.
    #[serde(default = "default_card_fill")]
    pub fill: Rgba,
}

fn default_corner_radius() -> f64 {
    32.0
}

fn default_card_fill() -> Rgba {
    Rgba::new(1.0, 1.0, 1.0, 1.0)
}

impl Default for CardSpec {
    fn default() -> Self {
        Self {
            width: 855.0,
            height: 540.0,
            corner_radius: default_corner_radius(),
            fill: default_card_fill(),
        }
    }
}

impl CardSpec {
    /// Validate dimensions and radius.
    pub fn validate(&self) -> CardResult<()> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(CardError::validation("card width/height must be > 0"));
        }
        let max_r = self.width.min(self.height) / 2.0;
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 || self.corner_radius > max_r
        {
            return Err(CardError::validation(format!(
                "card corner_radius must be in [0, {max_r}]"
            )));
        }
        Ok(())
    }

    /// Canvas pixel dimensions for this card in landscape orientation.
    pub fn pixel_size(&self) -> (u32, u32) {
        (to_px(self.width), to_px(self.height))
    }

    /// Landscape card size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

pub(crate) fn to_px(v: f64) -> u32 {
    v.round().max(1.0) as u32
}

/// Orientation of a template and therefore of the canvases it is applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Landscape: canvas is `card.width x card.height`.
    #[default]
    Horizontal,
    /// Portrait: canvas is `card.height x card.width`.
    Vertical,
}

impl Layout {
    /// Canvas size for this orientation.
    pub fn canvas_size(self, card: &CardSpec) -> Size {
        match self {
            Self::Horizontal => Size::new(card.width, card.height),
            Self::Vertical => Size::new(card.height, card.width),
        }
    }

    /// Where layers are centred on a canvas of this orientation.
    pub fn card_center(self, card: &CardSpec) -> Point {
        let s = self.canvas_size(card);
        Point::new(s.width / 2.0, s.height / 2.0)
    }

    /// Rotation applied to the (landscape) card clip.
    pub fn clip_angle_deg(self) -> f64 {
        match self {
            Self::Horizontal => 0.0,
            Self::Vertical => 90.0,
        }
    }
}

/// Reference point on a layer used when positioning it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Layer centre.
    Center,
    /// Layer top-left corner (before rotation).
    TopLeft,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
