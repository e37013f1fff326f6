//! Subtree rasterization: margins, SVG sanitization and decoding, the ordered strategy chain and
//! the recursive group compositor.

pub(crate) mod margin;
pub(crate) mod sanitize;
pub(crate) mod scene;
pub(crate) mod strategy;
pub(crate) mod subtree;
pub(crate) mod svg;
