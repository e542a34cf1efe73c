use log::debug;
use logging_timer::time;
use serde::Serialize;

use crate::{
    config::AnswerKey,
    grid::CellMatrix,
    image_utils::{count_pixels, WHITE},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    /// The chosen option per question. `None` only when a minimum fill is
    /// configured and no cell in the question reached it.
    pub selections: Vec<Option<u32>>,
    /// Ink pixel counts per question, per option.
    pub fill_counts: Vec<Vec<u32>>,
    pub correct: u32,
    pub questions: u32,
    /// Percentage of questions answered correctly, in `[0, 100]`.
    pub score: f64,
}

/// Ink pixel count of every cell, in the same order as the cells.
pub fn fill_counts(cells: &CellMatrix) -> Vec<u32> {
    cells
        .cells()
        .iter()
        .map(|cell| count_pixels(cell, &WHITE))
        .collect()
}

/// Picks the option with the most ink. The lowest index wins ties, so a
/// blank question selects option 0 unless `min_fill_pixels` rules it out.
pub fn select_option(counts: &[u32], min_fill_pixels: Option<u32>) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for (option, &count) in counts.iter().enumerate() {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((option as u32, count)),
        }
    }

    let (option, count) = best?;
    match min_fill_pixels {
        Some(min) if count < min => None,
        _ => Some(option),
    }
}

/// Grades row-major fill counts (`questions` rows of `answers` counts)
/// against the answer key.
pub fn score_fill_counts(
    fill_counts: &[u32],
    questions: u32,
    answers: u32,
    answer_key: &AnswerKey,
    min_fill_pixels: Option<u32>,
) -> GradeReport {
    debug_assert_eq!(fill_counts.len(), (questions * answers) as usize);

    let rows = fill_counts
        .chunks(answers.max(1) as usize)
        .map(|row| row.to_vec())
        .collect::<Vec<Vec<u32>>>();

    let mut selections = Vec::with_capacity(rows.len());
    let mut correct: u32 = 0;
    for (question, counts) in rows.iter().enumerate() {
        let selection = select_option(counts, min_fill_pixels);
        let expected = answer_key.get(question);
        debug!(
            "question {}: fill {:?}, selected {:?}, expected {:?}",
            question, counts, selection, expected
        );
        if selection.is_some() && selection == expected {
            correct += 1;
        }
        selections.push(selection);
    }

    let score = if questions == 0 {
        0.0
    } else {
        correct as f64 / questions as f64 * 100.0
    };

    GradeReport {
        selections,
        fill_counts: rows,
        correct,
        questions,
        score,
    }
}

#[time]
pub fn evaluate(
    cells: &CellMatrix,
    answer_key: &AnswerKey,
    min_fill_pixels: Option<u32>,
) -> GradeReport {
    score_fill_counts(
        &fill_counts(cells),
        cells.questions(),
        cells.answers(),
        answer_key,
        min_fill_pixels,
    )
}
