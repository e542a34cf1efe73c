use image::imageops::grayscale;
use image::RgbImage;
use imageproc::{
    contours::{find_contours, Contour},
    edges::canny,
    filter::gaussian_blur_f32,
    geometry::{approximate_polygon_dp, arc_length},
    point::Point,
};
use log::debug;
use logging_timer::time;

use crate::config::GradingConfig;
use crate::types::Quadrilateral;

/// Which contours to keep from an edge image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourRetrieval {
    /// Every contour, including those nested inside others.
    All,
    /// Only contours with no enclosing contour.
    External,
}

impl ContourRetrieval {
    fn includes(&self, contour: &Contour<i32>) -> bool {
        match self {
            ContourRetrieval::All => true,
            ContourRetrieval::External => contour.parent.is_none(),
        }
    }
}

/// Grayscale, blur, Canny, then trace the borders of the edge image.
#[time]
pub fn find_edge_contours(
    img: &RgbImage,
    config: &GradingConfig,
    retrieval: ContourRetrieval,
) -> Vec<Vec<Point<i32>>> {
    let gray = grayscale(img);
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    let edges = canny(
        &blurred,
        config.canny_low_threshold,
        config.canny_high_threshold,
    );

    let contours = find_contours::<i32>(&edges);
    let total = contours.len();
    let kept = contours
        .into_iter()
        .filter(|contour| retrieval.includes(contour))
        .map(|contour| contour.points)
        .collect::<Vec<_>>();
    debug!(
        "found {} contours, kept {} ({:?})",
        total,
        kept.len(),
        retrieval
    );
    kept
}

/// Approximates each contour as a polygon and keeps the four-sided ones,
/// largest area first.
///
/// The tolerance for each contour is `epsilon_ratio` times that contour's own
/// perimeter so the result doesn't depend on how large the sheet appears.
/// Equal areas keep their input order. Contours with fewer than four points
/// or no length are skipped.
pub fn find_quadrilaterals(contours: &[Vec<Point<i32>>], epsilon_ratio: f64) -> Vec<Quadrilateral> {
    let mut quadrilaterals = contours
        .iter()
        .filter_map(|contour| {
            if contour.len() < 4 {
                return None;
            }
            let epsilon = epsilon_ratio * arc_length(contour, true);
            if !(epsilon.is_finite() && epsilon > 0.0) {
                return None;
            }
            let polygon = approximate_polygon_dp(contour, epsilon, true);
            <[Point<i32>; 4]>::try_from(polygon)
                .ok()
                .map(Quadrilateral::new)
        })
        .collect::<Vec<Quadrilateral>>();

    quadrilaterals.sort_by(|a, b| b.area.total_cmp(&a.area));
    quadrilaterals
}
