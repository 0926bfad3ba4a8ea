use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbaImage};

/// Downscales an image to `max_width` keeping its aspect ratio.
///
/// Images already narrow enough, or `max_width == 0`, are returned unchanged.
pub fn downscale(img: &RgbaImage, max_width: u32) -> RgbaImage {
    let (width, height) = img.dimensions();
    if max_width == 0 || width <= max_width {
        return img.clone();
    }

    let scale = max_width as f32 / width as f32;
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    imageops::resize(img, max_width, new_height, FilterType::Lanczos3)
}

/// Grayscale copy for OCR input.
pub fn to_grayscale(img: &RgbaImage) -> GrayImage {
    DynamicImage::ImageRgba8(img.clone()).to_luma8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn test_downscale_keeps_aspect_ratio() {
        let img = RgbaImage::new(2000, 1000);
        let scaled = downscale(&img, 1000);
        assert_eq!(scaled.dimensions(), (1000, 500));
    }

    #[test]
    fn test_downscale_small_image_unchanged() {
        let img = RgbaImage::from_pixel(300, 200, Rgba([10, 20, 30, 255]));
        let scaled = downscale(&img, 1280);
        assert_eq!(scaled.dimensions(), (300, 200));
        assert_eq!(*scaled.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_downscale_disabled() {
        let img = RgbaImage::new(5000, 10);
        assert_eq!(downscale(&img, 0).dimensions(), (5000, 10));
    }

    #[test]
    fn test_to_grayscale() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (2, 2));
        assert_eq!(*gray.get_pixel(1, 1), Luma([255]));
    }
}
