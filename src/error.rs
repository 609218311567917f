use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by callers that only care which stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Mismatch,
    Io,
}

#[derive(Debug, Error)]
pub enum RemarkError {
    #[error("parse error in {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("question mismatch in {source_name}: expected {expected:?}, found {found:?}")]
    Mismatch {
        source_name: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl RemarkError {
    pub fn parse(source_name: &str, reason: impl Into<String>) -> Self {
        RemarkError::Parse {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RemarkError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        RemarkError::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RemarkError::Parse { .. } => ErrorKind::Parse,
            RemarkError::Mismatch { .. } => ErrorKind::Mismatch,
            RemarkError::Io { .. } | RemarkError::Csv { .. } => ErrorKind::Io,
        }
    }
}

/// Finds the typed error anywhere in an `anyhow` chain.
pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|e| e.downcast_ref::<RemarkError>())
        .map(RemarkError::kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_context() {
        let err = anyhow::Error::new(RemarkError::parse("a.html", "no questions found"))
            .context("processing a.html");
        assert_eq!(kind_of(&err), Some(ErrorKind::Parse));
    }

    #[test]
    fn csv_errors_count_as_io() {
        let io = std::io::Error::other("disk full");
        let err = RemarkError::csv("out.csv", csv::Error::from(io));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
