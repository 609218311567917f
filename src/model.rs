use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One question as answered by one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: String,
    /// All option labels in display order.
    pub options: Vec<String>,
    pub options_selected: BTreeSet<String>,
    /// Options the exporter flags as correct, selected or not.
    pub options_valid: BTreeSet<String>,
    pub original_mark: f64,
}

impl QuestionRecord {
    pub fn answers(&self) -> usize {
        self.options.len()
    }

    pub fn valid(&self) -> usize {
        self.options_valid.len()
    }

    /// Selected options that are also valid.
    pub fn correct(&self) -> usize {
        self.options_selected.intersection(&self.options_valid).count()
    }

    pub fn incorrect(&self) -> usize {
        self.options_selected.difference(&self.options_valid).count()
    }

    pub fn selected_joined(&self) -> String {
        join_options(&self.options_selected)
    }
}

pub fn join_options(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

pub fn split_options(field: &str) -> BTreeSet<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResult {
    pub student_id: String,
    /// Input the result was extracted from.
    pub source: String,
    pub questions: Vec<QuestionRecord>,
    pub original_total: f64,
    pub recomputed_total: Option<f64>,
}

impl StudentResult {
    pub fn new(student_id: String, source: String, questions: Vec<QuestionRecord>) -> Self {
        let original_total = questions.iter().map(|q| q.original_mark).sum();
        Self {
            student_id,
            source,
            questions,
            original_total,
            recomputed_total: None,
        }
    }

    pub fn question_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.question_id.clone()).collect()
    }

    pub fn max_mark(&self) -> f64 {
        self.questions.iter().map(|q| q.valid() as f64).sum()
    }

    pub fn percentage(&self) -> f64 {
        let max = self.max_mark();
        if max == 0.0 {
            return 0.0;
        }
        self.recomputed_total.unwrap_or(0.0) / max * 100.0
    }

    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            student_id: self.student_id.clone(),
            original_total: self.original_total,
            recomputed_total: self.recomputed_total.unwrap_or(0.0),
            max_mark: self.max_mark(),
            percentage: self.percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub student_id: String,
    pub original_total: f64,
    pub recomputed_total: f64,
    pub max_mark: f64,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_follow_selection_and_validity() {
        let q = QuestionRecord {
            question_id: "Q2".into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            options_selected: set(&["B", "C"]),
            options_valid: set(&["B", "D"]),
            original_mark: 0.0,
        };
        assert_eq!(q.answers(), 4);
        assert_eq!(q.valid(), 2);
        assert_eq!(q.correct(), 1);
        assert_eq!(q.incorrect(), 1);
        assert_eq!(q.selected_joined(), "B,C");
    }

    #[test]
    fn split_ignores_blanks() {
        assert_eq!(split_options("B, C,,"), set(&["B", "C"]));
        assert!(split_options("").is_empty());
    }

    #[test]
    fn percentage_is_zero_without_valid_options() {
        let mut s = StudentResult::new("S".into(), "s.html".into(), Vec::new());
        s.recomputed_total = Some(3.0);
        assert_eq!(s.percentage(), 0.0);
    }
}
