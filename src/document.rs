use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use log::info;
use logging_timer::time;

use crate::{
    config::GradingConfig,
    contours::{find_edge_contours, find_quadrilaterals, ContourRetrieval},
    debug::{draw_contours_debug_image_mut, draw_quadrilateral_debug_image_mut, ImageDebugWriter},
    error::{GradeSheetError, GradeSheetResult, Stage},
    geometry::Segment,
    image_utils::GREEN,
    types::{Corners, Quadrilateral},
};

/// The sheet warped to a top-down view, plus where it was found in the photo.
#[derive(Debug, Clone)]
pub struct RectifiedDocument {
    pub image: RgbImage,
    pub boundary: Quadrilateral,
}

/// Finds the largest four-sided contour in the photo and warps it flat.
///
/// Every contour is considered, nested or not. The photo is expected to
/// already be at the configured canvas size.
#[time]
pub fn locate_document(
    photo: &RgbImage,
    config: &GradingConfig,
    debug: &ImageDebugWriter,
) -> GradeSheetResult<RectifiedDocument> {
    let contours = find_edge_contours(photo, config, ContourRetrieval::All);
    debug.write("contours", photo, |canvas| {
        draw_contours_debug_image_mut(canvas, &contours)
    });

    let quadrilaterals = find_quadrilaterals(&contours, config.approximation_ratio);
    let boundary = match quadrilaterals.first() {
        Some(quadrilateral) => *quadrilateral,
        None => {
            return Err(GradeSheetError::NoQuadrilateralFound {
                stage: Stage::LocateDocument,
                contours: contours.len(),
            })
        }
    };

    let corners = boundary.corners();
    info!(
        "document boundary {:?} (area {}, {} quadrilateral candidates)",
        corners.to_tuples(),
        boundary.area,
        quadrilaterals.len()
    );
    debug.write("document", photo, |canvas| {
        draw_quadrilateral_debug_image_mut(canvas, &corners, GREEN)
    });

    let image = match four_point_transform(photo, &corners) {
        Some(image) => image,
        None => {
            return Err(GradeSheetError::DegenerateQuadrilateral {
                stage: Stage::LocateDocument,
                corners: corners.to_tuples(),
            })
        }
    };
    debug.write("rectified", &image, |_| {});

    Ok(RectifiedDocument { image, boundary })
}

/// Warps the region bounded by `corners` onto an axis-aligned rectangle.
///
/// The output is as wide as the longer of the top and bottom edges and as tall
/// as the longer of the left and right edges. Returns `None` when the corners
/// don't span an area.
pub fn four_point_transform(img: &RgbImage, corners: &Corners) -> Option<RgbImage> {
    let top = Segment::from_points(corners.top_left, corners.top_right).length();
    let bottom = Segment::from_points(corners.bottom_left, corners.bottom_right).length();
    let left = Segment::from_points(corners.top_left, corners.bottom_left).length();
    let right = Segment::from_points(corners.top_right, corners.bottom_right).length();

    let width = top.max(bottom) as u32;
    let height = left.max(right) as u32;
    if width < 2 || height < 2 {
        return None;
    }

    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;
    let from = corners.to_array().map(|p| (p.x as f32, p.y as f32));
    let to = [(0.0, 0.0), (max_x, 0.0), (max_x, max_y), (0.0, max_y)];
    let projection = Projection::from_control_points(from, to)?;

    let mut out = RgbImage::new(width, height);
    warp_into(img, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
    Some(out)
}
