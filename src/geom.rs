use crate::error::{StageError, StageResult};

/// Signed pixel location. Off-screen points are legal; drawing clips.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Logical size of a physical canvas under a power-of-two upscale bit.
    pub fn shr(self, bit: u8) -> Self {
        Self::new(self.width >> bit, self.height >> bit)
    }
}

/// Source rectangle inside an image. Always non-negative, so unsigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Error unless `self` fits entirely inside `bounds` (width × height).
    pub fn check_within(self, bounds: Size) -> StageResult<()> {
        let fits_x = self.x.checked_add(self.width).is_some_and(|r| r <= bounds.width);
        let fits_y = self
            .y
            .checked_add(self.height)
            .is_some_and(|b| b <= bounds.height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(StageError::out_of_bounds(format!(
                "rect {}x{}+{}+{} exceeds {}x{}",
                self.width, self.height, self.x, self.y, bounds.width, bounds.height
            )))
        }
    }
}
