//! Template asset decoding, palette extraction and caching.

pub(crate) mod decode;
pub(crate) mod palette;
pub(crate) mod store;
