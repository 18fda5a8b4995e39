use crate::{
    error::StageResult,
    geom::{Point, Rect, Size},
    pixel::PixelBuf,
    raster::RasterImage,
};

/// How to carve a picture out of an image. Every field has an independent
/// default: no frame means the whole image, location and offset default to
/// the origin.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PictureSpec {
    #[serde(default)]
    pub frame: Option<Rect>,
    #[serde(default)]
    pub location: Point,
    #[serde(default)]
    pub offset: Point,
}

/// A draw-ready sub-image. Owns an independent copy of its pixels, so the
/// backing image may be released without affecting it.
#[derive(Clone, Debug)]
pub struct Picture {
    pixels: PixelBuf,
    location: Point,
    offset: Point,
}

impl Picture {
    pub fn from_image(image: &RasterImage, spec: PictureSpec) -> StageResult<Self> {
        let frame = spec.frame.unwrap_or_else(|| image.full_bounds());
        Ok(Self {
            pixels: image.subregion(frame)?,
            location: spec.location,
            offset: spec.offset,
        })
    }

    pub fn pixels(&self) -> &PixelBuf {
        &self.pixels
    }

    pub fn location(&self) -> Point {
        self.location
    }

    /// No bounds checking: off-screen locations are legal and clip at draw.
    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    /// Draw position including the fixed offset.
    pub fn draw_origin(&self) -> Point {
        self.location + self.offset
    }
}

/// How to create a surface. `size` defaults to the screen size right-shifted
/// by the resolution bit (the native unscaled resolution).
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSpec {
    #[serde(default)]
    pub location: Point,
    #[serde(default)]
    pub size: Option<Size>,
}

/// A persistent off-screen canvas. Pictures baked into it become part of its
/// buffer permanently; there is no way to remove one afterwards.
#[derive(Clone, Debug)]
pub struct Surface {
    pixels: PixelBuf,
    location: Point,
}

impl Surface {
    pub fn new(location: Point, size: Size) -> Self {
        Self {
            pixels: PixelBuf::new(size.width, size.height),
            location,
        }
    }

    pub fn pixels(&self) -> &PixelBuf {
        &self.pixels
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    /// Blit `picture` into this surface at the picture's own location.
    ///
    /// Takes the picture by value: baking is a one-way ownership transfer.
    /// The picture's pixels live on only inside this surface.
    pub fn bake(&mut self, picture: Picture) {
        let at = picture.location();
        self.pixels.blit(picture.pixels(), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_4x4() -> RasterImage {
        let mut data = Vec::new();
        for i in 0..16u8 {
            data.extend_from_slice(&[i, i, i, 255]);
        }
        RasterImage {
            pixels: PixelBuf::from_raw(4, 4, data).unwrap(),
            source: "mem.png".into(),
        }
    }

    #[test]
    fn picture_defaults_to_full_image_at_origin() {
        let img = image_4x4();
        let pic = Picture::from_image(&img, PictureSpec::default()).unwrap();
        assert_eq!(pic.pixels(), &img.pixels);
        assert_eq!(pic.location(), Point::ZERO);
        assert_eq!(pic.draw_origin(), Point::ZERO);
    }

    #[test]
    fn picture_frame_and_offset() {
        let img = image_4x4();
        let pic = Picture::from_image(
            &img,
            PictureSpec {
                frame: Some(Rect::new(1, 1, 2, 2)),
                location: Point::new(5, 6),
                offset: Point::new(-1, 2),
            },
        )
        .unwrap();
        assert_eq!(pic.pixels().width(), 2);
        assert_eq!(pic.pixels().pixel(0, 0), img.pixels.pixel(1, 1));
        assert_eq!(pic.draw_origin(), Point::new(4, 8));
    }

    #[test]
    fn picture_frame_out_of_bounds_errors() {
        let img = image_4x4();
        let res = Picture::from_image(
            &img,
            PictureSpec {
                frame: Some(Rect::new(2, 2, 3, 3)),
                ..Default::default()
            },
        );
        assert!(res.is_err());
    }

    #[test]
    fn picture_is_independent_of_its_image() {
        let img = image_4x4();
        let pic = Picture::from_image(&img, PictureSpec::default()).unwrap();
        let expected = img.pixels.clone();
        drop(img);
        assert_eq!(pic.pixels(), &expected);
    }

    #[test]
    fn surface_starts_transparent_and_bakes_at_picture_location() {
        let img = image_4x4();
        let mut surface = Surface::new(Point::ZERO, Size::new(8, 8));
        assert_eq!(surface.pixels().pixel(0, 0), Some([0, 0, 0, 0]));

        let pic = Picture::from_image(
            &img,
            PictureSpec {
                location: Point::new(2, 3),
                ..Default::default()
            },
        )
        .unwrap();
        surface.bake(pic);
        assert_eq!(surface.pixels().pixel(2, 3), img.pixels.pixel(0, 0));
        assert_eq!(surface.pixels().pixel(5, 6), img.pixels.pixel(3, 3));
        assert_eq!(surface.pixels().pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
