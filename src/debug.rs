use std::path::{Path, PathBuf};

use image::{GrayImage, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_cross_mut, draw_hollow_rect_mut, draw_line_segment_mut},
    point::Point,
    rect::Rect,
};
use log::{debug, warn};

use crate::{
    config::AnswerKey,
    geometry::to_f32,
    image_utils::{BLUE, DARK_GREEN, GREEN, PINK, RAINBOW, RED, WHITE_RGB},
    types::{Corners, Size},
};

/// Creates a path for a debug image.
pub fn debug_image_path(base: &Path, label: &str) -> PathBuf {
    let mut result = PathBuf::from(base);
    result.set_file_name(format!(
        "{}_debug_{}.png",
        base.file_stem().unwrap_or_default().to_string_lossy(),
        label
    ));
    result
}

/// Writes intermediate images next to the input photo. A disabled writer
/// does nothing, and drawing closures passed to it never run.
#[derive(Debug, Clone)]
pub struct ImageDebugWriter {
    input_path: Option<PathBuf>,
}

impl ImageDebugWriter {
    pub fn new(input_path: PathBuf) -> Self {
        Self {
            input_path: Some(input_path),
        }
    }

    pub fn disabled() -> Self {
        Self { input_path: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.input_path.is_some()
    }

    /// Draws on a copy of `base` and saves it under `label`.
    pub fn write<F>(&self, label: &str, base: &RgbImage, draw: F)
    where
        F: FnOnce(&mut RgbImage),
    {
        let Some(input_path) = &self.input_path else {
            return;
        };

        let mut canvas = base.clone();
        draw(&mut canvas);

        let path = debug_image_path(input_path, label);
        match canvas.save(&path) {
            Ok(()) => debug!("wrote debug image {}", path.display()),
            Err(e) => warn!("unable to write debug image {}: {}", path.display(), e),
        }
    }

    /// Like [`ImageDebugWriter::write`] for a single-channel image.
    pub fn write_gray<F>(&self, label: &str, base: &GrayImage, draw: F)
    where
        F: FnOnce(&mut RgbImage),
    {
        if !self.is_enabled() {
            return;
        }
        let rgb = RgbImage::from_fn(base.width(), base.height(), |x, y| {
            let luma = base.get_pixel(x, y).0[0];
            Rgb([luma, luma, luma])
        });
        self.write(label, &rgb, draw);
    }
}

/// Draws every contour's points, cycling through colors.
pub fn draw_contours_debug_image_mut(canvas: &mut RgbImage, contours: &[Vec<Point<i32>>]) {
    let (width, height) = canvas.dimensions();
    for (i, contour) in contours.iter().enumerate() {
        let color = RAINBOW[i % RAINBOW.len()];
        for point in contour {
            if point.x >= 0 && point.y >= 0 && (point.x as u32) < width && (point.y as u32) < height
            {
                canvas.put_pixel(point.x as u32, point.y as u32, color);
            }
        }
    }
}

/// Outlines a quadrilateral and marks its top-left and bottom-right corners.
pub fn draw_quadrilateral_debug_image_mut(canvas: &mut RgbImage, corners: &Corners, color: Rgb<u8>) {
    let points = corners.to_array();
    for (i, start) in points.iter().enumerate() {
        let start = to_f32(*start);
        let end = to_f32(points[(i + 1) % points.len()]);
        draw_line_segment_mut(canvas, (start.x, start.y), (end.x, end.y), color);
    }

    draw_cross_mut(canvas, PINK, corners.top_left.x, corners.top_left.y);
    draw_cross_mut(canvas, BLUE, corners.bottom_right.x, corners.bottom_right.y);
}

/// Outlines every cell of the grid, plus each question's selected cell: green
/// when it matches the key and red otherwise.
pub fn draw_grid_debug_image_mut(
    canvas: &mut RgbImage,
    cell_size: Size<u32>,
    questions: u32,
    answers: u32,
    selections: &[Option<u32>],
    answer_key: &AnswerKey,
) {
    if cell_size.width == 0 || cell_size.height == 0 {
        return;
    }

    let cell_rect = |question: u32, option: u32| {
        Rect::at(
            (option * cell_size.width) as i32,
            (question * cell_size.height) as i32,
        )
        .of_size(cell_size.width, cell_size.height)
    };

    for question in 0..questions {
        for option in 0..answers {
            draw_hollow_rect_mut(canvas, cell_rect(question, option), DARK_GREEN);
        }
    }

    for (question, selection) in selections.iter().enumerate() {
        let question = question as u32;
        match selection {
            Some(option) => {
                let color = if answer_key.get(question as usize) == Some(*option) {
                    GREEN
                } else {
                    RED
                };
                draw_hollow_rect_mut(canvas, cell_rect(question, *option), color);
            }
            None => {
                let row = Rect::at(0, (question * cell_size.height) as i32)
                    .of_size(cell_size.width * answers, cell_size.height);
                draw_hollow_rect_mut(canvas, row, WHITE_RGB);
            }
        }
    }
}
