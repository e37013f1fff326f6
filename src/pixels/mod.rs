//! Pixel utilities: offscreen buffers, drawing access and image encode/decode.

pub(crate) mod buffer;
pub(crate) mod codec;
