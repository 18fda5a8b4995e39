use crate::{
    error::{StageError, StageResult},
    geom::{Point, Rect, Size},
};

/// Straight (non-premultiplied) RGBA8 pixel buffer, row-major, tightly packed.
///
/// This engine composites by straight copy only, so pixels are never
/// premultiplied and no blending happens on any path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuf {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuf {
    /// Transparent buffer of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> StageResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(StageError::validation(format!(
                "pixel buffer length {} does not match {width}x{height} rgba8 ({expected})",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Extract an independent copy of `rect`. Errors if the rect does not fit.
    pub fn subregion(&self, rect: Rect) -> StageResult<Self> {
        rect.check_within(self.size())?;

        let mut out = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
        for row in 0..rect.height {
            let y = (rect.y + row) as usize;
            let start = (y * self.width as usize + rect.x as usize) * 4;
            let end = start + rect.width as usize * 4;
            out.extend_from_slice(&self.data[start..end]);
        }

        Self::from_raw(rect.width, rect.height, out)
    }

    /// Straight-copy `src` at `at`, clipped to this buffer on all four edges.
    pub fn blit(&mut self, src: &Self, at: Point) {
        let (x0, x1, y0, y1) = match clip(self.size(), src.size(), at, 0) {
            Some(r) => r,
            None => return,
        };

        let row_bytes = (x1 - x0) as usize * 4;
        for dy in y0..y1 {
            let sy = (dy - at.y as i64) as usize;
            let sx = (x0 - at.x as i64) as usize;
            let s = (sy * src.width as usize + sx) * 4;
            let d = (dy as usize * self.width as usize + x0 as usize) * 4;
            self.data[d..d + row_bytes].copy_from_slice(&src.data[s..s + row_bytes]);
        }
    }

    /// Straight-copy `src` with each source pixel expanded to a `2^shift`
    /// square block, destination origin at `at << shift`. Clipped like `blit`.
    pub fn blit_scaled(&mut self, src: &Self, at: Point, shift: u8) {
        if shift == 0 {
            self.blit(src, at);
            return;
        }

        let (x0, x1, y0, y1) = match clip(self.size(), src.size(), at, shift) {
            Some(r) => r,
            None => return,
        };
        let ox = (at.x as i64) << shift;
        let oy = (at.y as i64) << shift;

        for dy in y0..y1 {
            let sy = ((dy - oy) >> shift) as usize;
            let src_row = sy * src.width as usize;
            let dst_row = dy as usize * self.width as usize;
            for dx in x0..x1 {
                let sx = ((dx - ox) >> shift) as usize;
                let s = (src_row + sx) * 4;
                let d = (dst_row + dx as usize) * 4;
                self.data[d..d + 4].copy_from_slice(&src.data[s..s + 4]);
            }
        }
    }
}

/// Intersect the scaled source extent with the destination bounds.
/// Returns `(x0, x1, y0, y1)` in destination coordinates, or `None` when the
/// overlap is empty.
fn clip(dst: Size, src: Size, at: Point, shift: u8) -> Option<(i64, i64, i64, i64)> {
    let ox = (at.x as i64) << shift;
    let oy = (at.y as i64) << shift;
    let sw = (src.width as i64) << shift;
    let sh = (src.height as i64) << shift;

    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + sw).min(dst.width as i64);
    let y1 = (oy + sh).min(dst.height as i64);

    if x0 >= x1 || y0 >= y1 {
        None
    } else {
        Some((x0, x1, y0, y1))
    }
}
