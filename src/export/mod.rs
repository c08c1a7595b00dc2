use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use crate::models::Workout;
use crate::settings::Settings;

pub mod markdown;

pub use markdown::MarkdownGenerator;

/// Single notification shown to the user for any export failure
pub const EXPORT_FAILURE_MESSAGE: &str = "Failed to generate export. Check the logs for details.";

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Workout {id} is not finished")]
    UnfinishedWorkout { id: String },
    #[error("Invalid export settings: {0}")]
    InvalidSettings(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export sink failed: {0}")]
    Sink(String),
}

impl ExportError {
    /// Every export failure is reported to the user the same way
    pub fn user_message(&self) -> String {
        EXPORT_FAILURE_MESSAGE.to_string()
    }
}

/// Note name for an exported workout: `<template name or "Workout"> - <yyyy-MM-dd>`.
///
/// Characters outside `[A-Za-z0-9-_ ]` are dropped from the template name.
pub fn suggested_file_name(workout: &Workout, settings: &Settings) -> String {
    let base: String = workout
        .template_name
        .as_deref()
        .unwrap_or("Workout")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    let base = if base.trim().is_empty() { "Workout".to_string() } else { base };

    let date = settings.local_time(workout.start_time).format("%Y-%m-%d");
    format!("{} - {}", base, date)
}

/// Destination for a rendered note
pub trait ExportSink {
    /// Hand off the note; returns a description of where it went
    fn deliver(&mut self, file_name: &str, markdown: &str) -> Result<String, ExportError>;
}

/// Writes `<dir>/<file name>.md`
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileSink {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ExportSink for FileSink {
    fn deliver(&mut self, file_name: &str, markdown: &str) -> Result<String, ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.md", file_name));
        let mut file = std::fs::File::create(&path)?;
        file.write_all(markdown.as_bytes())?;
        Ok(path.display().to_string())
    }
}

/// Prints the note to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ExportSink for StdoutSink {
    fn deliver(&mut self, _file_name: &str, markdown: &str) -> Result<String, ExportError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(markdown.as_bytes())?;
        handle.flush()?;
        Ok("stdout".to_string())
    }
}

/// Export boundary: validate, render, deliver
pub struct ExportManager;

impl ExportManager {
    /// Render a finished workout and hand it to `sink`.
    /// Failures are logged here; callers only need `user_message()`.
    pub fn export_workout<S: ExportSink + ?Sized>(
        workout: &Workout,
        settings: &Settings,
        sink: &mut S,
    ) -> Result<String, ExportError> {
        let result = Self::validate(workout, settings).and_then(|()| {
            let markdown = MarkdownGenerator::generate(workout, settings);
            let file_name = suggested_file_name(workout, settings);
            sink.deliver(&file_name, &markdown)
        });

        match &result {
            Ok(location) => info!(workout_id = %workout.id, %location, "Exported workout"),
            Err(err) => error!(workout_id = %workout.id, error = %err, "Workout export failed"),
        }

        result
    }

    fn validate(workout: &Workout, settings: &Settings) -> Result<(), ExportError> {
        if !workout.is_finished() {
            return Err(ExportError::UnfinishedWorkout {
                id: workout.id.clone(),
            });
        }

        let problems = settings.validation_errors();
        if !problems.is_empty() {
            return Err(ExportError::InvalidSettings(problems.join("; ")));
        }

        Ok(())
    }
}
