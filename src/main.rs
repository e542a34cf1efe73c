extern crate log;
extern crate pretty_env_logger;

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{arg, command, value_parser, Command};
use log::info;

use crate::config::GradingConfig;
use crate::pipeline::{grade_sheet, grade_sheets, GradeOptions};

mod answer_block;
mod config;
mod contours;
mod debug;
mod document;
mod error;
mod evaluate;
mod geometry;
mod grid;
mod image_utils;
mod pipeline;
mod types;

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");
    let json = matches.get_flag("json");
    let image_paths = matches
        .get_many::<PathBuf>("images")
        .map(|paths| paths.cloned().collect::<Vec<PathBuf>>())
        .unwrap_or_default();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(config_path) => match GradingConfig::from_json_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit(1);
            }
        },
        None => GradingConfig::default(),
    };

    if let Some(title) = &config.title {
        info!("grading {}", title);
    }

    let options = GradeOptions { config, debug };
    let results = match image_paths.as_slice() {
        [image_path] => vec![grade_sheet(image_path, &options)],
        _ => match grade_sheets(&image_paths, &options) {
            Ok(results) => results,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit(1);
            }
        },
    };

    let show_paths = image_paths.len() > 1;
    let mut failed = false;
    for (image_path, result) in image_paths.iter().zip(results) {
        match result {
            Ok(graded) if json => {
                println!(
                    "{}",
                    serde_json::json!({ "path": image_path, "sheet": graded })
                );
            }
            Ok(graded) if show_paths => {
                println!("{}: {:.1}", image_path.display(), graded.report.score);
            }
            Ok(graded) => println!("{:.1}", graded.report.score),
            Err(e) => {
                failed = true;
                report_failure(image_path, &e.to_string(), show_paths);
            }
        }
    }

    if failed {
        exit(1);
    }
}

fn report_failure(image_path: &Path, message: &str, show_path: bool) {
    if show_path {
        eprintln!("Error: {}: {}", image_path.display(), message);
    } else {
        eprintln!("Error: {}", message);
    }
}

#[allow(clippy::cognitive_complexity)]
fn cli() -> Command {
    command!()
        .arg(
            arg!(-c --config <PATH> "Path to a grading config JSON file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(-d --debug "Write debug images next to each input image"))
        .arg(arg!(-j --json "Print one JSON object per graded sheet"))
        .arg(
            arg!(images: <IMAGE> ... "Paths to photos of answer sheets")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}
