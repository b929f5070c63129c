//! CPU rasterization of card canvases.

pub(crate) mod blur;
pub(crate) mod cpu;
pub(crate) mod frame;
