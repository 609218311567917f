use crate::{
    error::RemarkError,
    model::{StudentResult, SummaryRow, split_options},
    postprocess::file_stem,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const STUDENT_HEADER: [&str; 8] = [
    "question_id",
    "options_selected",
    "original_mark",
    "recomputed_mark",
    "answers",
    "valid_answers",
    "correct",
    "incorrect",
];

pub const SUMMARY_HEADER: [&str; 5] = [
    "student_id",
    "original_total",
    "recomputed_total",
    "max_mark",
    "percentage",
];

/// One row of a per-student CSV as read back from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentCsvRow {
    pub question_id: String,
    #[serde(deserialize_with = "de_options")]
    pub options_selected: BTreeSet<String>,
    pub original_mark: f64,
    pub recomputed_mark: f64,
    pub answers: usize,
    pub valid_answers: usize,
    pub correct: usize,
    pub incorrect: usize,
}

fn de_options<'de, D>(d: D) -> Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    Ok(split_options(&raw))
}

pub fn student_csv_path(dir: &Path, student_id: &str) -> PathBuf {
    dir.join(format!("{}.csv", file_stem(student_id)))
}

fn create_file(path: &Path, overwrite: bool) -> Result<std::fs::File, RemarkError> {
    let mut opts = OpenOptions::new();
    opts.write(true);
    if overwrite {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }
    let file = opts.open(path).map_err(|e| {
        if e.kind() == ErrorKind::AlreadyExists {
            RemarkError::io(
                path,
                std::io::Error::new(ErrorKind::AlreadyExists, "refusing to overwrite (output.overwrite = false)"),
            )
        } else {
            RemarkError::io(path, e)
        }
    })?;
    Ok(file)
}

fn open_writer(path: &Path, overwrite: bool) -> Result<csv::Writer<std::fs::File>, RemarkError> {
    let file = create_file(path, overwrite)?;
    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}

pub fn write_student_csv(
    path: &Path,
    student: &StudentResult,
    marks: &[f64],
    overwrite: bool,
) -> Result<(), RemarkError> {
    if marks.len() != student.questions.len() {
        return Err(RemarkError::Mismatch {
            source_name: student.source.clone(),
            expected: student.question_ids(),
            found: (1..=marks.len()).map(|i| format!("mark #{i}")).collect(),
        });
    }

    let mut w = open_writer(path, overwrite)?;
    w.write_record(STUDENT_HEADER)
        .map_err(|e| RemarkError::csv(path, e))?;
    for (q, mark) in student.questions.iter().zip(marks) {
        w.write_record([
            q.question_id.clone(),
            q.selected_joined(),
            q.original_mark.to_string(),
            mark.to_string(),
            q.answers().to_string(),
            q.valid().to_string(),
            q.correct().to_string(),
            q.incorrect().to_string(),
        ])
        .map_err(|e| RemarkError::csv(path, e))?;
    }
    w.flush().map_err(|e| RemarkError::io(path, e))
}

pub fn read_student_csv(path: &Path) -> Result<Vec<StudentCsvRow>, RemarkError> {
    let mut r = csv::Reader::from_path(path).map_err(|e| RemarkError::csv(path, e))?;
    let mut rows: Vec<StudentCsvRow> = Vec::new();
    for row in r.deserialize() {
        rows.push(row.map_err(|e| RemarkError::csv(path, e))?);
    }
    Ok(rows)
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow], overwrite: bool) -> Result<(), RemarkError> {
    let mut w = open_writer(path, overwrite)?;
    w.write_record(SUMMARY_HEADER)
        .map_err(|e| RemarkError::csv(path, e))?;
    for row in rows {
        w.write_record([
            row.student_id.clone(),
            row.original_total.to_string(),
            row.recomputed_total.to_string(),
            row.max_mark.to_string(),
            row.percentage.to_string(),
        ])
        .map_err(|e| RemarkError::csv(path, e))?;
    }
    w.flush().map_err(|e| RemarkError::io(path, e))
}

pub fn read_summary_csv(path: &Path) -> Result<Vec<SummaryRow>, RemarkError> {
    let mut r = csv::Reader::from_path(path).map_err(|e| RemarkError::csv(path, e))?;
    let mut rows: Vec<SummaryRow> = Vec::new();
    for row in r.deserialize() {
        rows.push(row.map_err(|e| RemarkError::csv(path, e))?);
    }
    Ok(rows)
}

/// Machine-readable record of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started: String,
    pub finished: String,
    pub scheme: String,
    pub summary_csv: String,
    pub inputs: Vec<InputReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputReport {
    pub path: String,
    pub sha256: Option<String>,
    pub ok: bool,
    pub student_id: Option<String>,
    pub student_csv: Option<String>,
    pub error: Option<String>,
}

pub fn report_json_path(summary: &Path) -> PathBuf {
    let stem = summary
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("summary");
    summary.with_file_name(format!("{stem}.report.json"))
}

pub fn write_report_json(path: &Path, report: &RunReport, overwrite: bool) -> Result<(), RemarkError> {
    let mut file = create_file(path, overwrite)?;
    serde_json::to_writer_pretty(&mut file, report)
        .map_err(|e| RemarkError::io(path, std::io::Error::from(e)))?;
    file.write_all(b"\n").map_err(|e| RemarkError::io(path, e))
}
