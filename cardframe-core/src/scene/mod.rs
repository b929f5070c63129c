//! Canvas, layers and photo mounting.

pub(crate) mod canvas;
pub(crate) mod layer;
pub(crate) mod mount;
pub(crate) mod shadow;
