use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops, ImageFormat, RgbaImage};

use crate::geometry::CropRect;

use super::{SurfaceError, SurfaceResult};

/// Integer pixel window of a crop inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a normalized crop onto an `image_width`x`image_height` image. The
/// output size truncates like a canvas dimension assignment and is trimmed to
/// stay inside the image.
pub fn crop_region(image_width: u32, image_height: u32, crop: CropRect) -> PixelRegion {
    let to_pixels = |fraction: f64, extent: u32| -> u32 {
        (fraction.max(0.0) * f64::from(extent)).min(f64::from(extent)) as u32
    };
    let x = to_pixels(crop.x, image_width);
    let y = to_pixels(crop.y, image_height);
    let width = to_pixels(crop.w, image_width).min(image_width - x);
    let height = to_pixels(crop.h, image_height).min(image_height - y);
    PixelRegion {
        x,
        y,
        width,
        height,
    }
}

pub fn crop_image(image: &RgbaImage, crop: CropRect) -> SurfaceResult<RgbaImage> {
    let region = crop_region(image.width(), image.height(), crop);
    if region.width == 0 || region.height == 0 {
        return Err(SurfaceError::EmptyCrop {
            width: region.width,
            height: region.height,
        });
    }
    Ok(imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image())
}

pub fn encode_png(image: &RgbaImage) -> SurfaceResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_region_scales_normalized_rect_to_pixels() {
        let region = crop_region(1000, 500, CropRect::new(0.25, 0.25, 0.5, 0.5));
        assert_eq!(
            region,
            PixelRegion {
                x: 250,
                y: 125,
                width: 500,
                height: 250,
            }
        );
    }

    #[test]
    fn crop_region_truncates_fractional_pixels_and_stays_inside() {
        let region = crop_region(10, 10, CropRect::new(0.95, 0.0, 0.3, 1.0));
        assert_eq!(region.x, 9);
        assert_eq!(region.width, 1);
        assert_eq!(region.height, 10);
    }

    #[test]
    fn crop_image_produces_requested_size() {
        let image = RgbaImage::new(1000, 500);
        let cropped = crop_image(&image, CropRect::new(0.25, 0.25, 0.5, 0.5))
            .expect("crop should succeed");
        assert_eq!(cropped.dimensions(), (500, 250));
    }

    #[test]
    fn crop_image_copies_selected_pixels() {
        let mut image = RgbaImage::new(4, 4);
        image.put_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
        let cropped = crop_image(&image, CropRect::new(0.5, 0.25, 0.5, 0.5))
            .expect("crop should succeed");
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(*cropped.get_pixel(0, 0), image::Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn crop_image_rejects_zero_sized_output() {
        let image = RgbaImage::new(100, 100);
        let err = crop_image(&image, CropRect::new(0.5, 0.5, 0.0, 0.5))
            .expect_err("zero width should fail");
        assert!(matches!(
            err,
            SurfaceError::EmptyCrop {
                width: 0,
                height: 50
            }
        ));
    }

    #[test]
    fn png_data_url_round_trips_through_decoder() {
        let image = RgbaImage::new(6, 3);
        let bytes = encode_png(&image).expect("png encoding");
        let url = png_data_url(&bytes);
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (6, 3));
    }
}
