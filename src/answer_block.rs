use image::{imageops::crop_imm, GrayImage, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use log::info;
use logging_timer::time;

use crate::{
    config::GradingConfig,
    contours::{find_edge_contours, find_quadrilaterals, ContourRetrieval},
    debug::{draw_quadrilateral_debug_image_mut, ImageDebugWriter},
    error::{GradeSheetError, GradeSheetResult, Stage},
    image_utils::{apply_mask, GREEN, WHITE},
    types::Corners,
};

/// The bubble grid cut out of the rectified document.
#[derive(Debug, Clone)]
pub struct AnswerRegion {
    /// The masked document cropped to `bounds`.
    pub image: RgbImage,
    /// Document-sized mask that is white exactly inside `bounds`.
    pub mask: GrayImage,
    pub bounds: Rect,
}

/// Finds the outer border of the answer grid and crops the document to it.
///
/// Only external contours are considered so the bubbles inside the grid
/// can't compete with its border.
#[time]
pub fn locate_answer_block(
    document: &RgbImage,
    config: &GradingConfig,
    debug: &ImageDebugWriter,
) -> GradeSheetResult<AnswerRegion> {
    let contours = find_edge_contours(document, config, ContourRetrieval::External);
    let quadrilaterals = find_quadrilaterals(&contours, config.approximation_ratio);
    let block = match quadrilaterals.first() {
        Some(quadrilateral) => *quadrilateral,
        None => {
            return Err(GradeSheetError::NoQuadrilateralFound {
                stage: Stage::LocateAnswerBlock,
                contours: contours.len(),
            })
        }
    };

    let corners = block.corners();
    info!(
        "answer block {:?} (area {}, {} quadrilateral candidates)",
        corners.to_tuples(),
        block.area,
        quadrilaterals.len()
    );
    debug.write("answer_block", document, |canvas| {
        draw_quadrilateral_debug_image_mut(canvas, &corners, GREEN)
    });

    let bounds = crop_bounds(&corners, config.crop_margin, document.dimensions())?;
    info!(
        "cropping answer block to ({}, {}) {}x{}",
        bounds.left(),
        bounds.top(),
        bounds.width(),
        bounds.height()
    );

    let mask = rectangle_mask(document.dimensions(), bounds);
    let masked = apply_mask(document, &mask);
    let image = crop_imm(
        &masked,
        bounds.left() as u32,
        bounds.top() as u32,
        bounds.width(),
        bounds.height(),
    )
    .to_image();
    debug.write_gray("mask", &mask, |_| {});
    debug.write("masked", &image, |_| {});

    Ok(AnswerRegion {
        image,
        mask,
        bounds,
    })
}

/// The crop rectangle spanning from the top-left corner to the bottom-right
/// corner, both shifted by `margin` pixels along each axis.
///
/// The bottom-right edge is exclusive. The rectangle must be non-empty and
/// lie entirely within a document of the given dimensions.
pub fn crop_bounds(
    corners: &Corners,
    margin: i32,
    (width, height): (u32, u32),
) -> GradeSheetResult<Rect> {
    let left = corners.top_left.x + margin;
    let top = corners.top_left.y + margin;
    let right = corners.bottom_right.x + margin;
    let bottom = corners.bottom_right.y + margin;

    let within_document = left >= 0
        && top >= 0
        && right as i64 <= width as i64
        && bottom as i64 <= height as i64;
    if !within_document || right <= left || bottom <= top {
        return Err(GradeSheetError::InvalidCropBounds {
            left,
            top,
            right,
            bottom,
            width,
            height,
        });
    }

    Ok(Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32))
}

fn rectangle_mask((width, height): (u32, u32), bounds: Rect) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    draw_filled_rect_mut(&mut mask, bounds, WHITE);
    mask
}

#[cfg(test)]
pub(crate) mod test {
    use image::Rgb;
    use imageproc::{drawing::draw_hollow_rect_mut, point::Point};

    use super::*;
    use crate::image_utils::count_pixels;

    pub const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
    pub const INK: Rgb<u8> = Rgb([0, 0, 0]);

    /// Draws a rectangular frame `thickness` pixels wide, growing inward.
    pub fn draw_frame_mut(canvas: &mut RgbImage, rect: Rect, thickness: u32) {
        for i in 0..thickness {
            let inset = Rect::at(rect.left() + i as i32, rect.top() + i as i32)
                .of_size(rect.width() - 2 * i, rect.height() - 2 * i);
            draw_hollow_rect_mut(canvas, inset, INK);
        }
    }

    fn corners(left: i32, top: i32, right: i32, bottom: i32) -> Corners {
        Corners {
            top_left: Point::new(left, top),
            top_right: Point::new(right, top),
            bottom_right: Point::new(right, bottom),
            bottom_left: Point::new(left, bottom),
        }
    }

    #[test]
    fn test_crop_bounds_applies_margin() {
        let bounds = crop_bounds(&corners(100, 150, 500, 650), 8, (600, 800)).unwrap();
        assert_eq!(bounds, Rect::at(108, 158).of_size(400, 500));
    }

    #[test]
    fn test_crop_bounds_outside_document() {
        let result = crop_bounds(&corners(100, 150, 595, 650), 8, (600, 800));
        match result {
            Err(GradeSheetError::InvalidCropBounds { right, width, .. }) => {
                assert_eq!(right, 603);
                assert_eq!(width, 600);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let result = crop_bounds(&corners(-20, 0, 100, 100), 8, (600, 800));
        assert!(matches!(result, Err(GradeSheetError::InvalidCropBounds { .. })));
    }

    #[test]
    fn test_crop_bounds_empty() {
        let result = crop_bounds(&corners(100, 100, 100, 200), 8, (600, 800));
        assert!(matches!(result, Err(GradeSheetError::InvalidCropBounds { .. })));
    }

    #[test]
    fn test_locate_answer_block() {
        let mut document = RgbImage::from_pixel(600, 800, PAPER);
        draw_frame_mut(&mut document, Rect::at(100, 150).of_size(420, 520), 4);
        // bubbles inside the grid must not be picked over its border
        for i in 0..5 {
            draw_hollow_rect_mut(
                &mut document,
                Rect::at(130 + 80 * i, 190).of_size(40, 40),
                INK,
            );
        }

        let region = locate_answer_block(
            &document,
            &GradingConfig::default(),
            &ImageDebugWriter::disabled(),
        )
        .unwrap();

        assert!((region.bounds.left() - 107).abs() <= 3, "{:?}", region.bounds);
        assert!((region.bounds.top() - 157).abs() <= 3, "{:?}", region.bounds);
        assert!((region.bounds.width() as i32 - 421).abs() <= 4, "{:?}", region.bounds);
        assert!((region.bounds.height() as i32 - 521).abs() <= 4, "{:?}", region.bounds);
        assert_eq!(
            region.image.dimensions(),
            (region.bounds.width(), region.bounds.height())
        );
        assert_eq!(region.mask.dimensions(), (600, 800));
        assert_eq!(
            count_pixels(&region.mask, &WHITE),
            region.bounds.width() * region.bounds.height()
        );
    }

    #[test]
    fn test_answer_block_not_found() {
        let document = RgbImage::from_pixel(600, 800, PAPER);
        let result = locate_answer_block(
            &document,
            &GradingConfig::default(),
            &ImageDebugWriter::disabled(),
        );
        assert!(matches!(
            result,
            Err(GradeSheetError::NoQuadrilateralFound {
                stage: Stage::LocateAnswerBlock,
                ..
            })
        ));
    }

    #[test]
    fn test_answer_block_margin_past_document_edge() {
        let mut document = RgbImage::from_pixel(300, 300, PAPER);
        draw_frame_mut(&mut document, Rect::at(50, 50).of_size(246, 246), 4);

        let result = locate_answer_block(
            &document,
            &GradingConfig::default(),
            &ImageDebugWriter::disabled(),
        );
        assert!(matches!(
            result,
            Err(GradeSheetError::InvalidCropBounds { .. })
        ));
    }
}
