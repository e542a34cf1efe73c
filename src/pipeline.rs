use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};
use imageproc::rect::Rect;
use log::{debug, info};
use logging_timer::time;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    answer_block::{locate_answer_block, AnswerRegion},
    config::GradingConfig,
    debug::{draw_grid_debug_image_mut, ImageDebugWriter},
    document::{locate_document, RectifiedDocument},
    error::{GradeSheetError, GradeSheetResult, Stage},
    evaluate::{evaluate, GradeReport},
    grid::{split_grid, threshold_answer_region, CellMatrix},
    image_utils::size_image_to_fit,
    types::Corners,
};

#[derive(Debug, Clone)]
pub struct GradeOptions {
    pub config: GradingConfig,
    pub debug: bool,
}

/// The outcome of grading one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSheet {
    /// Sheet corners in the resized photo: top-left, top-right, bottom-right,
    /// bottom-left.
    pub document_corners: [(i32, i32); 4],
    /// Answer grid crop in the rectified document: top-left corner and
    /// exclusive bottom-right corner.
    pub answer_block: [(i32, i32); 2],
    pub report: GradeReport,
}

/// Where a sheet is in the grading pipeline. Each state owns the output of
/// the stage that produced it.
pub enum SheetState {
    Start {
        photo: RgbImage,
    },
    DocumentLocated {
        document: RectifiedDocument,
    },
    GridLocated {
        region: AnswerRegion,
        document_corners: Corners,
    },
    GridSplit {
        cells: CellMatrix,
        thresholded: GrayImage,
        document_corners: Corners,
        answer_block: Rect,
    },
    Scored(GradedSheet),
}

impl Display for SheetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SheetState::Start { .. } => "start",
            SheetState::DocumentLocated { .. } => "document located",
            SheetState::GridLocated { .. } => "grid located",
            SheetState::GridSplit { .. } => "grid split",
            SheetState::Scored(_) => "scored",
        };
        write!(f, "{}", name)
    }
}

impl SheetState {
    /// The stage [`SheetState::advance`] runs from this state.
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            SheetState::Start { .. } => Some(Stage::LocateDocument),
            SheetState::DocumentLocated { .. } => Some(Stage::LocateAnswerBlock),
            SheetState::GridLocated { .. } => Some(Stage::SplitGrid),
            SheetState::GridSplit { .. } => Some(Stage::Evaluate),
            SheetState::Scored(_) => None,
        }
    }

    /// Runs the next stage, consuming this state. `Scored` is terminal.
    pub fn advance(
        self,
        config: &GradingConfig,
        debug: &ImageDebugWriter,
    ) -> GradeSheetResult<SheetState> {
        match self {
            SheetState::Start { photo } => {
                let photo =
                    size_image_to_fit(&photo, config.canvas_size.width, config.canvas_size.height);
                let document = locate_document(&photo, config, debug)?;
                Ok(SheetState::DocumentLocated { document })
            }

            SheetState::DocumentLocated { document } => {
                let region = locate_answer_block(&document.image, config, debug)?;
                Ok(SheetState::GridLocated {
                    region,
                    document_corners: document.boundary.corners(),
                })
            }

            SheetState::GridLocated {
                region,
                document_corners,
            } => {
                let thresholded = threshold_answer_region(&region.image, config.ink_threshold);
                let cells = split_grid(&thresholded, config.questions, config.answers);
                Ok(SheetState::GridSplit {
                    cells,
                    thresholded,
                    document_corners,
                    answer_block: region.bounds,
                })
            }

            SheetState::GridSplit {
                cells,
                thresholded,
                document_corners,
                answer_block,
            } => {
                let report = evaluate(&cells, &config.answer_key, config.min_fill_pixels);
                debug.write_gray("graded", &thresholded, |canvas| {
                    draw_grid_debug_image_mut(
                        canvas,
                        cells.cell_size(),
                        cells.questions(),
                        cells.answers(),
                        &report.selections,
                        &config.answer_key,
                    )
                });

                Ok(SheetState::Scored(GradedSheet {
                    document_corners: document_corners.to_tuples(),
                    answer_block: [
                        (answer_block.left(), answer_block.top()),
                        (answer_block.right() + 1, answer_block.bottom() + 1),
                    ],
                    report,
                }))
            }

            SheetState::Scored(graded) => Ok(SheetState::Scored(graded)),
        }
    }
}

/// Grades a photo that has already been decoded. The configuration is
/// assumed valid.
#[time]
pub fn grade_photo(
    photo: RgbImage,
    config: &GradingConfig,
    debug: &ImageDebugWriter,
) -> GradeSheetResult<GradedSheet> {
    let mut state = SheetState::Start { photo };
    loop {
        if let Some(stage) = state.next_stage() {
            debug!("{}: running {}", state, stage);
        }
        state = match state.advance(config, debug)? {
            SheetState::Scored(graded) => {
                info!(
                    "scored {}/{} ({}%)",
                    graded.report.correct, graded.report.questions, graded.report.score
                );
                return Ok(graded);
            }
            next => next,
        };
    }
}

#[time]
pub fn load_sheet_image(image_path: &Path) -> GradeSheetResult<RgbImage> {
    match image::open(image_path) {
        Ok(img) => Ok(img.into_rgb8()),
        Err(source) => Err(GradeSheetError::ImageDecodeFailure {
            path: image_path.to_path_buf(),
            source,
        }),
    }
}

/// Validates the configuration, then loads and grades one photo.
pub fn grade_sheet(image_path: &Path, options: &GradeOptions) -> GradeSheetResult<GradedSheet> {
    options.config.validate()?;
    grade_validated_sheet(image_path, options)
}

/// Validates the configuration once, then grades every photo independently.
/// Results are in the same order as `image_paths`.
pub fn grade_sheets(
    image_paths: &[PathBuf],
    options: &GradeOptions,
) -> GradeSheetResult<Vec<GradeSheetResult<GradedSheet>>> {
    options.config.validate()?;
    Ok(image_paths
        .par_iter()
        .map(|image_path| grade_validated_sheet(image_path, options))
        .collect())
}

fn grade_validated_sheet(
    image_path: &Path,
    options: &GradeOptions,
) -> GradeSheetResult<GradedSheet> {
    let photo = load_sheet_image(image_path)?;
    let debug = if options.debug {
        ImageDebugWriter::new(image_path.to_path_buf())
    } else {
        ImageDebugWriter::disabled()
    };
    grade_photo(photo, &options.config, &debug)
}
