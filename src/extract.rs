//! Pulls student answers out of a Wiseflow result page.
//!
//! All knowledge of the exporter's layout lives here and in
//! [`crate::config::Markers`]; the rest of the crate only sees
//! [`StudentResult`].

use crate::{
    config::{Config, Markers, Postprocess},
    error::RemarkError,
    model::{QuestionRecord, StudentResult},
    postprocess::clean_text,
};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::debug;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").expect("static regex"));

pub struct Extractor {
    student: Selector,
    student_attr: String,
    student_attr_re: Regex,
    student_inner: Selector,
    question: Selector,
    question_id_attr: String,
    option_list: Selector,
    option: Selector,
    mark: Selector,
    class_correct: String,
    class_incorrect: String,
    class_valid: String,
    post: Postprocess,
}

impl Extractor {
    pub fn new(cfg: &Config) -> Result<Self> {
        let m: &Markers = &cfg.markers;
        Ok(Self {
            student: selector(&m.student)?,
            student_attr: m.student_attr.clone(),
            student_attr_re: Regex::new(&m.student_attr_pattern)
                .with_context(|| format!("markers.student_attr_pattern: {}", m.student_attr_pattern))?,
            student_inner: selector(&m.student_inner)?,
            question: selector(&m.question)?,
            question_id_attr: m.question_id_attr.clone(),
            option_list: selector(&m.option_list)?,
            option: selector(&m.option)?,
            mark: selector(&m.mark)?,
            class_correct: m.class_correct.clone(),
            class_incorrect: m.class_incorrect.clone(),
            class_valid: m.class_valid.clone(),
            post: cfg.postprocess.clone(),
        })
    }

    /// Extracts one student's answers. `source` only labels errors and the result.
    pub fn extract(&self, html: &str, source: &str) -> Result<StudentResult, RemarkError> {
        let doc = Html::parse_document(html);

        let student_id = self.find_student(&doc, source)?;

        let blocks: Vec<ElementRef> = doc.select(&self.question).collect();
        if blocks.is_empty() {
            return Err(RemarkError::parse(source, "no questions found"));
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(blocks.len());
        for (i, block) in blocks.into_iter().enumerate() {
            let q = self.read_question(block, i + 1, source)?;
            if !seen.insert(q.question_id.clone()) {
                return Err(RemarkError::parse(
                    source,
                    format!("duplicate question id {:?}", q.question_id),
                ));
            }
            debug!(
                question = %q.question_id,
                selected = %q.selected_joined(),
                mark = q.original_mark,
                "question"
            );
            questions.push(q);
        }

        Ok(StudentResult::new(student_id, source.to_string(), questions))
    }

    fn find_student(&self, doc: &Html, source: &str) -> Result<String, RemarkError> {
        let el = doc
            .select(&self.student)
            .find(|el| {
                el.value()
                    .attr(&self.student_attr)
                    .is_some_and(|v| self.student_attr_re.is_match(v))
            })
            .ok_or_else(|| RemarkError::parse(source, "student name not found"))?;

        let text_el = el.select(&self.student_inner).next().unwrap_or(el);
        let name = clean_text(&self.post, &text_el.text().collect::<String>());
        if name.is_empty() {
            return Err(RemarkError::parse(source, "student name not found (empty text)"));
        }
        Ok(name)
    }

    fn read_question(
        &self,
        block: ElementRef,
        ordinal: usize,
        source: &str,
    ) -> Result<QuestionRecord, RemarkError> {
        let question_id = block
            .value()
            .attr(&self.question_id_attr)
            .map(|v| clean_text(&self.post, v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("Q{ordinal}"));

        let list = block.select(&self.option_list).next().ok_or_else(|| {
            RemarkError::parse(source, format!("question {question_id}: option list not found"))
        })?;

        let mut options = Vec::new();
        let mut options_selected = BTreeSet::new();
        let mut options_valid = BTreeSet::new();
        for (i, li) in list.select(&self.option).enumerate() {
            let label = option_label(i);
            let has = |class: &str| li.value().classes().any(|c| c == class);

            if has(self.class_correct.as_str()) {
                options_selected.insert(label.clone());
                options_valid.insert(label.clone());
            } else if has(self.class_incorrect.as_str()) {
                options_selected.insert(label.clone());
            } else if has(self.class_valid.as_str()) {
                options_valid.insert(label.clone());
            }
            options.push(label);
        }
        if options.is_empty() {
            return Err(RemarkError::parse(
                source,
                format!("question {question_id}: option list has no options"),
            ));
        }

        let mark_el = block.select(&self.mark).next().ok_or_else(|| {
            RemarkError::parse(source, format!("question {question_id}: mark not found"))
        })?;
        let mark_text = mark_el.text().collect::<String>();
        let original_mark = parse_mark(&mark_text).ok_or_else(|| {
            RemarkError::parse(
                source,
                format!("question {question_id}: unreadable mark {:?}", mark_text.trim()),
            )
        })?;

        Ok(QuestionRecord {
            question_id,
            options,
            options_selected,
            options_valid,
            original_mark,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// First number in the mark text; "1/2" reads as 1. Accepts a decimal comma.
pub fn parse_mark(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    m.as_str().replace(',', ".").parse().ok()
}

/// Spreadsheet-style labels: A..Z, AA, AB, ...
pub fn option_label(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_wrap_after_z() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(25), "Z");
        assert_eq!(option_label(26), "AA");
        assert_eq!(option_label(27), "AB");
    }

    #[test]
    fn mark_text_variants() {
        assert_eq!(parse_mark(" 1 "), Some(1.0));
        assert_eq!(parse_mark("0,5 / 1"), Some(0.5));
        assert_eq!(parse_mark("Score: -0.25"), Some(-0.25));
        assert_eq!(parse_mark("n/a"), None);
    }

    #[test]
    fn bad_selector_is_reported() {
        let mut cfg = Config::default();
        cfg.markers.option = "li[".into();
        let err = Extractor::new(&cfg).err().expect("should fail");
        assert!(err.to_string().contains("invalid selector"));
    }
}
