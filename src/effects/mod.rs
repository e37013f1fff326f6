//! Effect stack executor.
//!
//! Every transform here is a pure function from a premultiplied [`PixelBuffer`] to a new buffer of
//! the same size. Seeded distortions draw from [`XorShift32`], so identical inputs always produce
//! identical bytes.
//!
//! [`PixelBuffer`]: crate::pixels::buffer::PixelBuffer
//! [`XorShift32`]: crate::foundation::math::XorShift32

pub(crate) mod bloom;
pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod config;
pub(crate) mod glitch;
pub(crate) mod motion;
pub(crate) mod noise;
pub(crate) mod ramp;
pub(crate) mod shadow;
pub(crate) mod stack;
