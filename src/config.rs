use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GradeSheetError, GradeSheetResult};
use crate::types::Size;

/// The correct option index for each question, indexed by question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnswerKeyRepr", into = "Vec<u32>")]
pub struct AnswerKey(Vec<u32>);

/// Answer keys may be written as a list or as an object keyed by question.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerKeyRepr {
    List(Vec<u32>),
    Map(BTreeMap<u32, u32>),
}

impl TryFrom<AnswerKeyRepr> for AnswerKey {
    type Error = String;

    fn try_from(repr: AnswerKeyRepr) -> Result<Self, Self::Error> {
        match repr {
            AnswerKeyRepr::List(options) => Ok(Self(options)),
            AnswerKeyRepr::Map(map) => {
                // BTreeMap iterates in key order, so contiguity is a positional check.
                if let Some((position, question)) = map
                    .keys()
                    .enumerate()
                    .find(|(position, question)| *position as u32 != **question)
                {
                    return Err(format!(
                        "answer key questions must be numbered from 0 without gaps, \
                         found question {} at position {}",
                        question, position
                    ));
                }
                Ok(Self(map.into_values().collect()))
            }
        }
    }
}

impl From<AnswerKey> for Vec<u32> {
    fn from(key: AnswerKey) -> Self {
        key.0
    }
}

impl AnswerKey {
    pub fn new(options: Vec<u32>) -> Self {
        Self(options)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The correct option for `question`, if the key covers it.
    pub fn get(&self, question: usize) -> Option<u32> {
        self.0.get(question).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Every tunable constant of a grading run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingConfig {
    pub title: Option<String>,
    /// Photos are resized to this before anything else, so pixel offsets
    /// such as `crop_margin` mean the same thing for every input.
    pub canvas_size: Size<u32>,
    pub blur_sigma: f32,
    pub canny_low_threshold: f32,
    pub canny_high_threshold: f32,
    /// Polygon approximation tolerance as a fraction of each contour's perimeter.
    pub approximation_ratio: f64,
    pub crop_margin: i32,
    /// Grayscale values above this are paper, at or below it are ink.
    pub ink_threshold: u8,
    pub questions: u32,
    pub answers: u32,
    pub answer_key: AnswerKey,
    /// When set, a question whose darkest cell has fewer ink pixels than
    /// this has no selection.
    pub min_fill_pixels: Option<u32>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            title: None,
            canvas_size: Size {
                width: 800,
                height: 1000,
            },
            blur_sigma: 1.1,
            canny_low_threshold: 10.0,
            canny_high_threshold: 70.0,
            approximation_ratio: 0.02,
            crop_margin: 8,
            ink_threshold: 170,
            questions: 5,
            answers: 5,
            answer_key: AnswerKey::new(vec![0, 3, 1, 4, 0]),
            min_fill_pixels: None,
        }
    }
}

impl GradingConfig {
    /// Reads and validates a configuration file.
    pub fn from_json_file(path: &Path) -> GradeSheetResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| GradeSheetError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GradingConfig =
            serde_json::from_str(&json).map_err(|source| GradeSheetError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the grid shape and answer key agree and that the image
    /// processing constants are usable.
    pub fn validate(&self) -> GradeSheetResult<()> {
        let mismatch = |reason: String| GradeSheetError::GridShapeMismatch {
            questions: self.questions,
            answers: self.answers,
            reason,
        };

        if self.questions == 0 || self.answers == 0 {
            return Err(mismatch(
                "the grid needs at least one question and one answer".to_string(),
            ));
        }

        if self.questions.checked_mul(self.answers).is_none() {
            return Err(mismatch("the grid has too many cells".to_string()));
        }

        if self.answer_key.len() != self.questions as usize {
            return Err(mismatch(format!(
                "the answer key has {} entries",
                self.answer_key.len()
            )));
        }

        if let Some((question, option)) = self
            .answer_key
            .iter()
            .enumerate()
            .find(|(_, option)| *option >= self.answers)
        {
            return Err(mismatch(format!(
                "question {} expects option {}",
                question, option
            )));
        }

        if self.canvas_size.width == 0 || self.canvas_size.height == 0 {
            return Err(GradeSheetError::InvalidConfiguration(format!(
                "canvas size {}x{} is empty",
                self.canvas_size.width, self.canvas_size.height
            )));
        }

        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(GradeSheetError::InvalidConfiguration(format!(
                "blur sigma must be positive, got {}",
                self.blur_sigma
            )));
        }

        if !(0.0..=self.canny_high_threshold).contains(&self.canny_low_threshold) {
            return Err(GradeSheetError::InvalidConfiguration(format!(
                "edge thresholds must satisfy 0 <= low <= high, got {} and {}",
                self.canny_low_threshold, self.canny_high_threshold
            )));
        }

        if !(self.approximation_ratio.is_finite() && self.approximation_ratio > 0.0) {
            return Err(GradeSheetError::InvalidConfiguration(format!(
                "approximation ratio must be positive, got {}",
                self.approximation_ratio
            )));
        }

        Ok(())
    }
}
