//! Re-marking. A scheme maps one extracted question to a mark; the system
//! never assumes a particular scheme because marking rules are exam-specific.

use crate::{
    config::{AnswerKeyEntry, KeyRule, Marking},
    model::{QuestionRecord, StudentResult},
};
use anyhow::{Result, anyhow, bail};
use std::collections::{BTreeSet, HashMap};

pub trait MarkScheme {
    fn name(&self) -> &str;

    /// Rejects exams the scheme cannot mark, before anything is written.
    fn check(&self, _questions: &[QuestionRecord]) -> Result<()> {
        Ok(())
    }

    fn score(&self, question: &QuestionRecord) -> f64;
}

/// Wraps an operator-supplied closure.
pub struct FnScheme<F> {
    name: String,
    f: F,
}

impl<F> FnScheme<F>
where
    F: Fn(&QuestionRecord) -> f64,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> MarkScheme for FnScheme<F>
where
    F: Fn(&QuestionRecord) -> f64,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, question: &QuestionRecord) -> f64 {
        (self.f)(question)
    }
}

/// Example scheme: all-or-nothing for single-answer questions, otherwise one
/// point per correct selection and a quarter point off per wrong one.
pub struct WiseflowExample;

impl MarkScheme for WiseflowExample {
    fn name(&self) -> &str {
        "wiseflow_example"
    }

    fn score(&self, q: &QuestionRecord) -> f64 {
        if q.valid() == 1 {
            if q.correct() == 1 && q.incorrect() == 0 { 1.0 } else { 0.0 }
        } else {
            q.correct() as f64 - q.incorrect() as f64 * 0.25
        }
    }
}

/// Keeps whatever the exporter awarded.
pub struct Original;

impl MarkScheme for Original {
    fn name(&self) -> &str {
        "original"
    }

    fn score(&self, q: &QuestionRecord) -> f64 {
        q.original_mark
    }
}

pub struct AnswerKey {
    keys: HashMap<String, (BTreeSet<String>, KeyRule)>,
}

impl AnswerKey {
    pub fn new(entries: &[AnswerKeyEntry]) -> Result<Self> {
        let mut keys = HashMap::new();
        for e in entries {
            if let KeyRule::PerOption { min, max, .. } = e.rule {
                if !(min <= max) {
                    bail!("answer key for {:?}: min {min} exceeds max {max}", e.question);
                }
            }
            let correct: BTreeSet<String> = e.correct.iter().map(|s| s.trim().to_string()).collect();
            if keys
                .insert(e.question.clone(), (correct, e.rule.clone()))
                .is_some()
            {
                bail!("answer key lists question {:?} twice", e.question);
            }
        }
        Ok(Self { keys })
    }
}

impl MarkScheme for AnswerKey {
    fn name(&self) -> &str {
        "answer_key"
    }

    fn check(&self, questions: &[QuestionRecord]) -> Result<()> {
        let missing: Vec<&str> = questions
            .iter()
            .map(|q| q.question_id.as_str())
            .filter(|id| !self.keys.contains_key(*id))
            .collect();
        if !missing.is_empty() {
            bail!("answer key has no entry for {}", missing.join(", "));
        }
        Ok(())
    }

    fn score(&self, q: &QuestionRecord) -> f64 {
        let Some((correct, rule)) = self.keys.get(&q.question_id) else {
            return 0.0;
        };
        match *rule {
            KeyRule::Exact { points } => {
                if q.options_selected == *correct { points } else { 0.0 }
            }
            KeyRule::PerOption {
                per_correct,
                per_incorrect,
                max,
                min,
            } => {
                let hits = q.options_selected.intersection(correct).count() as f64;
                let misses = q.options_selected.difference(correct).count() as f64;
                (hits * per_correct - misses * per_incorrect).clamp(min, max)
            }
        }
    }
}

pub fn from_config(cfg: &Marking) -> Result<Box<dyn MarkScheme>> {
    match cfg.scheme.as_str() {
        "wiseflow_example" => Ok(Box::new(WiseflowExample)),
        "original" => Ok(Box::new(Original)),
        "answer_key" => {
            if cfg.answer_key.is_empty() {
                bail!("marking.scheme = \"answer_key\" needs [[marking.answer_key]] entries");
            }
            Ok(Box::new(AnswerKey::new(&cfg.answer_key)?))
        }
        other => Err(anyhow!("unknown marking.scheme: {other}")),
    }
}

pub fn evaluate(scheme: &dyn MarkScheme, question: &QuestionRecord) -> f64 {
    scheme.score(question)
}

/// Marks every question and stores the total on the student.
pub fn remark(scheme: &dyn MarkScheme, student: &mut StudentResult) -> Result<Vec<f64>> {
    scheme.check(&student.questions)?;
    let marks: Vec<f64> = student
        .questions
        .iter()
        .map(|q| evaluate(scheme, q))
        .collect();
    student.recomputed_total = Some(marks.iter().sum());
    Ok(marks)
}
