use crate::{
    config::Config,
    error::{ErrorKind, RemarkError, kind_of},
    extract::Extractor,
    marking::{self, MarkScheme},
    model::{StudentResult, SummaryRow},
    report::{self, InputReport, RunReport},
    util::{ensure_dir, looks_like_url, now_rfc3339, sha256_hex},
};
use anyhow::{Context, Result, anyhow};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct Pipeline {
    cfg: Config,
    extractor: Extractor,
    scheme: Box<dyn MarkScheme>,
    /// Question ids of the first student that went through cleanly.
    reference: Option<Vec<String>>,
    /// Output files already written (or reserved) by this pipeline.
    claimed: HashSet<PathBuf>,
}

/// A student that has been extracted and re-marked.
#[derive(Debug, Clone)]
pub struct Marked {
    pub student: StudentResult,
    pub marks: Vec<f64>,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub rows: Vec<SummaryRow>,
    pub failures: Vec<FileFailure>,
    pub report: RunReport,
}

impl Pipeline {
    pub fn new(cfg: &Config, scheme: Box<dyn MarkScheme>) -> Result<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            extractor: Extractor::new(cfg)?,
            scheme,
            reference: None,
            claimed: HashSet::new(),
        })
    }

    /// Builds the pipeline with the scheme named in `[marking]`.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let scheme = marking::from_config(&cfg.marking)?;
        Self::new(cfg, scheme)
    }

    pub fn scheme_name(&self) -> &str {
        self.scheme.name()
    }

    /// Read, extract, check against earlier students and re-mark one input.
    pub fn load(&self, input: &Path) -> Result<Marked> {
        self.validate_input(input)?;

        let bytes = std::fs::read(input).map_err(|e| RemarkError::io(input, e))?;
        let sha256 = sha256_hex(&bytes);
        let html = String::from_utf8_lossy(&bytes);
        let source = input.display().to_string();

        let mut student = self.extractor.extract(&html, &source)?;
        info!(
            "extracted student={:?} questions={} original_total={}",
            student.student_id,
            student.questions.len(),
            student.original_total
        );

        if let Some(expected) = &self.reference {
            let found = student.question_ids();
            if *expected != found {
                return Err(RemarkError::Mismatch {
                    source_name: source,
                    expected: expected.clone(),
                    found,
                }
                .into());
            }
        }

        let marks = marking::remark(self.scheme.as_ref(), &mut student)
            .with_context(|| format!("marking {} with {}", input.display(), self.scheme.name()))?;
        debug!(?marks, "recomputed marks");

        Ok(Marked {
            student,
            marks,
            sha256,
        })
    }

    /// Processes one input to completion, writing its per-student CSV.
    pub fn process_file(&mut self, input: &Path, student_dir: &Path) -> Result<(Marked, PathBuf)> {
        let marked = self.load(input)?;
        let csv_path = report::student_csv_path(student_dir, &marked.student.student_id);
        let key = claim_key(&csv_path);
        if self.claimed.contains(&key) {
            return Err(RemarkError::io(
                &csv_path,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!(
                        "already written in this run; student {:?} clashes with an earlier output",
                        marked.student.student_id
                    ),
                ),
            )
            .into());
        }
        report::write_student_csv(
            &csv_path,
            &marked.student,
            &marked.marks,
            self.cfg.output.overwrite,
        )?;
        info!(
            "wrote {} recomputed_total={}",
            csv_path.display(),
            marked.student.recomputed_total.unwrap_or(0.0)
        );

        self.claimed.insert(key);
        if self.reference.is_none() {
            self.reference = Some(marked.student.question_ids());
        }
        Ok((marked, csv_path))
    }

    /// Runs every input in order, then writes the summary of those that succeeded.
    pub fn run(&mut self, summary: &Path, inputs: &[PathBuf]) -> Result<BatchOutcome> {
        let started = now_rfc3339();
        let student_dir = self.student_dir(summary);
        ensure_dir(&student_dir)?;

        self.claimed.insert(claim_key(summary));
        if self.cfg.output.write_report_json {
            self.claimed.insert(claim_key(&report::report_json_path(summary)));
        }

        let mut rows = Vec::new();
        let mut failures = Vec::new();
        let mut input_reports = Vec::new();

        for (i, input) in inputs.iter().enumerate() {
            info!("input {}/{} {}", i + 1, inputs.len(), input.display());
            match self.process_file(input, &student_dir) {
                Ok((marked, csv_path)) => {
                    rows.push(marked.student.summary_row());
                    input_reports.push(InputReport {
                        path: input.display().to_string(),
                        sha256: Some(marked.sha256),
                        ok: true,
                        student_id: Some(marked.student.student_id),
                        student_csv: Some(csv_path.display().to_string()),
                        error: None,
                    });
                }
                Err(err) => {
                    error!("{}: {:#}", input.display(), err);
                    input_reports.push(InputReport {
                        path: input.display().to_string(),
                        sha256: std::fs::read(input).ok().map(|b| sha256_hex(&b)),
                        ok: false,
                        student_id: None,
                        student_csv: None,
                        error: Some(format!("{err:#}")),
                    });
                    failures.push(FileFailure {
                        path: input.clone(),
                        kind: kind_of(&err),
                        message: format!("{err:#}"),
                    });
                    if self.cfg.global.fail_fast {
                        warn!("fail_fast set; skipping {} remaining input(s)", inputs.len() - i - 1);
                        break;
                    }
                }
            }
        }

        report::write_summary_csv(summary, &rows, self.cfg.output.overwrite)?;
        info!(
            "summary {} students={} failed={}",
            summary.display(),
            rows.len(),
            failures.len()
        );

        let report = RunReport {
            started,
            finished: now_rfc3339(),
            scheme: self.scheme.name().to_string(),
            summary_csv: summary.display().to_string(),
            inputs: input_reports,
        };

        if self.cfg.output.write_report_json {
            let path = report::report_json_path(summary);
            report::write_report_json(&path, &report, self.cfg.output.overwrite)
                .with_context(|| format!("writing {}", path.display()))?;
        }

        Ok(BatchOutcome {
            rows,
            failures,
            report,
        })
    }

    fn student_dir(&self, summary: &Path) -> PathBuf {
        if !self.cfg.output.student_dir.is_empty() {
            return PathBuf::from(&self.cfg.output.student_dir);
        }
        match summary.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn validate_input(&self, input: &Path) -> Result<()> {
        let input_str = input.display().to_string();

        if self.cfg.security.reject_url_inputs && looks_like_url(&input_str) {
            return Err(anyhow!(
                "URL inputs are not supported, save the page locally first: {input_str}"
            ));
        }

        if let Some(ext) = input.extension().and_then(|s| s.to_str()) {
            let ext = ext.to_ascii_lowercase();
            if ext != "html" && ext != "htm" {
                warn!("input does not look like HTML: {}", input.display());
            }
        }

        Ok(())
    }
}

/// Same file, however the path was spelled.
fn claim_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
