use image::{imageops::crop_imm, imageops::grayscale, GrayImage, RgbImage};
use log::debug;
use logging_timer::time;

use crate::{image_utils::binarize_inverted, types::Size};

/// A `questions` x `answers` grid of binarized cells stored row-major:
/// question outer, option inner.
#[derive(Debug, Clone)]
pub struct CellMatrix {
    questions: u32,
    answers: u32,
    cell_size: Size<u32>,
    cells: Vec<GrayImage>,
}

impl CellMatrix {
    pub fn questions(&self) -> u32 {
        self.questions
    }

    pub fn answers(&self) -> u32 {
        self.answers
    }

    pub fn cell_size(&self) -> Size<u32> {
        self.cell_size
    }

    /// Every cell, question outer and option inner.
    pub fn cells(&self) -> &[GrayImage] {
        &self.cells
    }
}

/// Converts the answer region to a binary image where ink is white.
pub fn threshold_answer_region(region: &RgbImage, ink_threshold: u8) -> GrayImage {
    binarize_inverted(&grayscale(region), ink_threshold)
}

/// Splits `img` into `questions` bands of `answers` cells each.
///
/// The image is first cut down to the largest height divisible by
/// `questions` and the largest width divisible by `answers`. The discarded
/// rows and columns at the bottom and right edges never reach any cell. A
/// region smaller than the grid yields empty cells.
#[time]
pub fn split_grid(img: &GrayImage, questions: u32, answers: u32) -> CellMatrix {
    let cell_size = Size {
        width: img.width() / answers,
        height: img.height() / questions,
    };
    debug!(
        "splitting {}x{} grid into {}x{} cells, dropping {} columns and {} rows",
        img.width(),
        img.height(),
        cell_size.width,
        cell_size.height,
        img.width() - cell_size.width * answers,
        img.height() - cell_size.height * questions
    );

    let mut cells = Vec::with_capacity((questions * answers) as usize);
    for question in 0..questions {
        for option in 0..answers {
            let cell = crop_imm(
                img,
                option * cell_size.width,
                question * cell_size.height,
                cell_size.width,
                cell_size.height,
            )
            .to_image();
            cells.push(cell);
        }
    }

    CellMatrix {
        questions,
        answers,
        cell_size,
        cells,
    }
}
