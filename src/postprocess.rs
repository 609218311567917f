use crate::config::Postprocess;
use unicode_normalization::UnicodeNormalization;

/// Normalise text pulled out of the exporter's markup before it is used as an
/// identifier or written to CSV.
pub fn clean_text(cfg: &Postprocess, raw: &str) -> String {
    let mut s = if cfg.collapse_whitespace {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        raw.trim().to_string()
    };

    if cfg.normalize_unicode {
        s = s.nfkc().collect::<String>();
    }

    s
}

/// Turns a student name into something safe to use as a file stem.
pub fn file_stem(student_id: &str) -> String {
    let stem: String = student_id
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect();

    match stem.trim_matches('.') {
        "" => "student".to_string(),
        s => s.to_string(),
    }
}
