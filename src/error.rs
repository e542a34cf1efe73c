use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configure,
    LoadImage,
    LocateDocument,
    LocateAnswerBlock,
    SplitGrid,
    Evaluate,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::LoadImage => "load image",
            Stage::LocateDocument => "locate document",
            Stage::LocateAnswerBlock => "locate answer block",
            Stage::SplitGrid => "split grid",
            Stage::Evaluate => "evaluate",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum GradeSheetError {
    #[error("{stage}: no four-sided contour among {contours} candidates")]
    NoQuadrilateralFound { stage: Stage, contours: usize },

    #[error("{stage}: corners {corners:?} do not span an area")]
    DegenerateQuadrilateral {
        stage: Stage,
        corners: [(i32, i32); 4],
    },

    #[error(
        "locate answer block: crop ({left}, {top})-({right}, {bottom}) is outside the {width}x{height} document"
    )]
    InvalidCropBounds {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        width: u32,
        height: u32,
    },

    #[error("configure: answer key does not fit a {questions}x{answers} grid: {reason}")]
    GridShapeMismatch {
        questions: u32,
        answers: u32,
        reason: String,
    },

    #[error("load image: unable to decode {}: {source}", .path.display())]
    ImageDecodeFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("configure: unable to read {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configure: unable to parse {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configure: {0}")]
    InvalidConfiguration(String),
}

impl GradeSheetError {
    pub fn stage(&self) -> Stage {
        match self {
            GradeSheetError::NoQuadrilateralFound { stage, .. }
            | GradeSheetError::DegenerateQuadrilateral { stage, .. } => *stage,
            GradeSheetError::InvalidCropBounds { .. } => Stage::LocateAnswerBlock,
            GradeSheetError::ImageDecodeFailure { .. } => Stage::LoadImage,
            GradeSheetError::GridShapeMismatch { .. }
            | GradeSheetError::ConfigRead { .. }
            | GradeSheetError::ConfigParse { .. }
            | GradeSheetError::InvalidConfiguration(_) => Stage::Configure,
        }
    }
}

pub type GradeSheetResult<T> = Result<T, GradeSheetError>;
