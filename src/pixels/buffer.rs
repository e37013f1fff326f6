use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{mul_div255_u8, mul_div255_u16};

/// Offscreen surface of premultiplied RGBA8 pixels, tightly packed, row-major.
///
/// Every pixel-producing step in the crate (SVG raster, PNG decode, effects) reads and writes this
/// type, so the premultiplied invariant `r, g, b <= a` holds end-to-end.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Hard ceiling on either dimension. Callers with larger needs must tile.
    pub const MAX_DIM: u32 = 16_384;

    /// Allocate a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> FxResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Wrap bytes that are already premultiplied.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> FxResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(FxError::validation(format!(
                "pixel buffer expects {len} bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap straight-alpha bytes, premultiplying in place.
    pub fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> FxResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(width, height, data)
    }

    /// Allocate a buffer filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> FxResult<Self> {
        let mut out = Self::new(width, height)?;
        out.fill(color);
        Ok(out)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Allocate a transparent buffer with the same dimensions.
    pub fn blank_like(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: vec![0u8; self.data.len()],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Read a pixel; out-of-range coordinates read as transparent.
    pub fn sample(&self, x: i32, y: i32) -> [u8; 4] {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return [0, 0, 0, 0];
        }
        let idx = self.index(x as u32, y as u32);
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Read a pixel with coordinates clamped to the edge.
    pub fn sample_clamped(&self, x: i32, y: i32) -> [u8; 4] {
        let x = x.clamp(0, self.width as i32 - 1);
        let y = y.clamp(0, self.height as i32 - 1);
        self.sample(x, y)
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[self.index(x, y) + 3]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.data[idx..idx + 4].copy_from_slice(&px);
    }

    pub fn fill(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for c in self.data.chunks_exact_mut(4) {
            c.copy_from_slice(&px);
        }
    }

    /// Composite `src` over this buffer with its top-left corner at `(dx, dy)`.
    ///
    /// Pixels of `src` falling outside this buffer are dropped.
    pub fn draw_over(&mut self, src: &PixelBuffer, dx: i32, dy: i32) {
        let x_start = dx.max(0);
        let y_start = dy.max(0);
        let x_end = (dx + src.width as i32).min(self.width as i32);
        let y_end = (dy + src.height as i32).min(self.height as i32);
        if x_start >= x_end || y_start >= y_end {
            return;
        }

        for y in y_start..y_end {
            for x in x_start..x_end {
                let s = src.sample(x - dx, y - dy);
                if s[3] == 0 {
                    continue;
                }
                let idx = self.index(x as u32, y as u32);
                let d = [
                    self.data[idx],
                    self.data[idx + 1],
                    self.data[idx + 2],
                    self.data[idx + 3],
                ];
                let out = premul_over_px(d, s);
                self.data[idx..idx + 4].copy_from_slice(&out);
            }
        }
    }

    /// Sparse non-emptiness probe: samples alpha on a coarse `grid x grid` lattice plus the center.
    ///
    /// Thin features between lattice points can be missed; callers treat a miss the same way as a
    /// failed decode and fall back to another strategy.
    pub fn has_visible_content(&self, grid: u32) -> bool {
        let grid = grid.max(1);
        let step_x = (self.width / grid).max(1);
        let step_y = (self.height / grid).max(1);

        if self.alpha_at(self.width / 2, self.height / 2) > 0 {
            return true;
        }
        let mut y = step_y / 2;
        while y < self.height {
            let mut x = step_x / 2;
            while x < self.width {
                if self.alpha_at(x, y) > 0 {
                    return true;
                }
                x += step_x;
            }
            y += step_y;
        }
        false
    }

    /// Exhaustive transparency check.
    pub fn is_fully_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Borrow the buffer as a tiny-skia drawing target.
    pub fn with_pixmap_mut<R>(
        &mut self,
        f: impl FnOnce(&mut resvg::tiny_skia::PixmapMut<'_>) -> R,
    ) -> FxResult<R> {
        let mut pixmap =
            resvg::tiny_skia::PixmapMut::from_bytes(&mut self.data, self.width, self.height)
                .ok_or_else(|| FxError::validation("pixel buffer is not a valid pixmap"))?;
        Ok(f(&mut pixmap))
    }
}

fn byte_len(width: u32, height: u32) -> FxResult<usize> {
    if width == 0 || height == 0 {
        return Err(FxError::validation(format!(
            "pixel buffer must be non-empty, got {width}x{height}"
        )));
    }
    if width > PixelBuffer::MAX_DIM || height > PixelBuffer::MAX_DIM {
        return Err(FxError::validation(format!(
            "pixel buffer too large: {width}x{height} (max {max}x{max})",
            max = PixelBuffer::MAX_DIM
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| FxError::validation("pixel buffer size overflow"))
}

pub(crate) fn premul_over_px(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = src[3].saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        out[c] = src[c].saturating_add(mul_div255_u8(u16::from(dst[c]), inv));
    }
    out
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u16(u16::from(px[0]), a) as u8;
        px[1] = mul_div255_u16(u16::from(px[1]), a) as u8;
        px[2] = mul_div255_u16(u16::from(px[2]), a) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in 0..3 {
            let v = (u32::from(px[c]) * 255 + a / 2) / a;
            px[c] = v.min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixels/buffer.rs"]
mod tests;
