//! Template descriptors and the routine that applies them to canvases.

pub(crate) mod apply;
pub(crate) mod model;
