use crate::{
    foundation::core::{CardSpec, Point, Size},
    scene::layer::Layer,
};

/// A rendering surface holding a card composition.
///
/// Drawing order is `background`, then `objects`, both clipped by `clip_path`, then `overlay`
/// unclipped on top.
#[derive(Clone, Debug)]
pub struct CardCanvas {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Card geometry this canvas was mounted with.
    pub card: CardSpec,
    /// Content layers in paint order; the first raster layer is the user's photo.
    pub objects: Vec<Layer>,
    /// Layer painted beneath the objects.
    pub background: Option<Layer>,
    /// Layer painted above everything, outside the clip.
    pub overlay: Option<Layer>,
    /// Shape that clips the background and objects.
    pub clip_path: Option<Layer>,
}

impl CardCanvas {
    /// Empty canvas.
    pub fn new(width: u32, height: u32, card: CardSpec) -> Self {
        Self {
            width,
            height,
            card,
            objects: Vec::new(),
            background: None,
            overlay: None,
            clip_path: None,
        }
    }

    /// Surface size.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Resize the backing surface. Layers are left where they are.
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Canvas centre.
    pub fn center(&self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Move `layer` to the canvas centre.
    pub fn center_object(&self, layer: &mut Layer) {
        layer.center = self.center();
    }

    /// Append a content layer.
    pub fn add(&mut self, layer: Layer) {
        self.objects.push(layer);
    }

    /// The user's photo: the first raster object.
    pub fn main_image(&self) -> Option<&Layer> {
        self.objects.iter().find(|l| l.is_image())
    }

    /// Mutable access to [`CardCanvas::main_image`].
    pub fn main_image_mut(&mut self) -> Option<&mut Layer> {
        self.objects.iter_mut().find(|l| l.is_image())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/canvas.rs"]
mod tests;
