use image::imageops::{invert, resize, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::threshold;

pub const WHITE: Luma<u8> = Luma([u8::MAX]);

pub const WHITE_RGB: Rgb<u8> = Rgb([255, 255, 255]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const PINK: Rgb<u8> = Rgb([255, 0, 255]);
pub const DARK_GREEN: Rgb<u8> = Rgb([0, 127, 0]);

pub const RAINBOW: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([255, 127, 0]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([139, 0, 255]),
];

/// Resizes an image to exactly `width` x `height`, ignoring aspect ratio.
pub fn size_image_to_fit(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    resize(img, width, height, FilterType::Triangle)
}

/// Inverted fixed-level binarization: pixels brighter than `level` become
/// black (background) and everything else becomes white (ink).
pub fn binarize_inverted(img: &GrayImage, level: u8) -> GrayImage {
    let mut out = threshold(img, level);
    invert(&mut out);
    out
}

/// Keeps the pixels of `img` where `mask` is non-zero and blacks out the rest.
///
/// Note that the sizes of the images must be equal.
pub fn apply_mask(img: &RgbImage, mask: &GrayImage) -> RgbImage {
    debug_assert_eq!(img.dimensions(), mask.dimensions());

    let mut out = RgbImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        if mask.get_pixel(x, y).0[0] != 0 {
            out.put_pixel(x, y, *pixel);
        }
    }
    out
}

/// Determines the number of pixels in an image that match the given luma.
pub fn count_pixels(img: &GrayImage, luma: &Luma<u8>) -> u32 {
    img.pixels().filter(|p| *p == luma).count() as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_binarize_inverted() {
        let img = GrayImage::from_raw(4, 1, vec![0, 170, 171, 255]).unwrap();
        let out = binarize_inverted(&img, 170);
        assert_eq!(out.into_raw(), vec![255, 255, 0, 0]);

        let out = binarize_inverted(&img, 0);
        assert_eq!(out.into_raw(), vec![255, 0, 0, 0]);
        assert_eq!(count_pixels(&binarize_inverted(&img, 255), &WHITE), 4);
    }

    #[test]
    fn test_apply_mask() {
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let mut mask = GrayImage::new(3, 2);
        mask.put_pixel(1, 1, WHITE);

        let out = apply_mask(&img, &mask);
        assert_eq!(*out.get_pixel(1, 1), Rgb([10, 20, 30]));
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(2, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_count_pixels() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(4, 4, WHITE);
        assert_eq!(count_pixels(&img, &WHITE), 2);
        assert_eq!(count_pixels(&img, &Luma([0])), 23);
    }

    #[test]
    fn test_size_image_to_fit() {
        let img = RgbImage::new(1600, 2000);
        assert_eq!(size_image_to_fit(&img, 800, 1000).dimensions(), (800, 1000));
        assert_eq!(size_image_to_fit(&img, 1600, 2000).dimensions(), (1600, 2000));
    }
}
