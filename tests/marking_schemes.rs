mod common;

use common::{page, q};
use wiseflow_remark::{
    config::{AnswerKeyEntry, Config, KeyRule},
    extract::Extractor,
    marking::{AnswerKey, FnScheme, MarkScheme, Original, WiseflowExample, evaluate, remark},
    model::{QuestionRecord, StudentResult},
};

fn student(name: &str, marks: [&str; 3]) -> StudentResult {
    let html = page(
        name,
        &[
            q("Q1", &["correct", "", ""], marks[0]),
            q("Q2", &["", "correct", "incorrect", "valid"], marks[1]),
            q("Q3", &["incorrect", "valid", ""], marks[2]),
        ],
    );
    Extractor::new(&Config::default())
        .unwrap()
        .extract(&html, name)
        .unwrap()
}

#[test]
fn recomputed_total_is_the_sum_of_question_marks() {
    let mut s = student("S1", ["1", "0", "0"]);
    let marks = remark(&WiseflowExample, &mut s).unwrap();

    assert_eq!(marks, vec![1.0, 0.75, 0.0]);
    assert_eq!(s.recomputed_total, Some(marks.iter().sum()));
}

#[test]
fn many_fractional_marks_do_not_drift() {
    let tenth = FnScheme::new("tenth", |_: &QuestionRecord| 0.1);
    let mut s = student("S1", ["0", "0", "0"]);
    let marks = remark(&tenth, &mut s).unwrap();
    let expected: f64 = marks.iter().sum();
    assert_eq!(s.recomputed_total, Some(expected));
}

#[test]
fn identical_answers_get_identical_totals() {
    let mut a = student("Alice", ["1", "0", "0"]);
    let mut b = student("Bob", ["0", "1", "0,5"]);
    assert_ne!(a.original_total, b.original_total);

    remark(&WiseflowExample, &mut a).unwrap();
    remark(&WiseflowExample, &mut b).unwrap();
    assert_eq!(a.recomputed_total, b.recomputed_total);
}

#[test]
fn closure_scheme_sees_question_ids() {
    let scheme = FnScheme::new("q1-only", |q: &QuestionRecord| if q.question_id == "Q1" { 2.0 } else { 0.0 });
    let mut s = student("S1", ["1", "0", "0"]);
    remark(&scheme, &mut s).unwrap();

    assert_eq!(scheme.name(), "q1-only");
    assert_eq!(s.recomputed_total, Some(2.0));
    assert_eq!(evaluate(&scheme, &s.questions[1]), 0.0);
}

#[test]
fn original_scheme_reproduces_exported_marks() {
    let mut s = student("S1", ["1", "0,5", "0"]);
    remark(&Original, &mut s).unwrap();
    assert_eq!(s.recomputed_total, Some(s.original_total));
}

#[test]
fn answer_key_must_cover_every_question() {
    let key = AnswerKey::new(&[AnswerKeyEntry {
        question: "Q1".into(),
        correct: vec!["A".into()],
        rule: KeyRule::Exact { points: 1.0 },
    }])
    .unwrap();
    let mut s = student("S1", ["1", "0", "0"]);

    let err = remark(&key, &mut s).unwrap_err();
    assert!(err.to_string().contains("Q2, Q3"));
    assert_eq!(s.recomputed_total, None);
}

#[test]
fn answer_key_exact_and_partial_rules() {
    let key = AnswerKey::new(&[
        AnswerKeyEntry {
            question: "Q1".into(),
            correct: vec!["A".into()],
            rule: KeyRule::Exact { points: 1.0 },
        },
        AnswerKeyEntry {
            question: "Q2".into(),
            correct: vec!["B".into(), "D".into()],
            rule: KeyRule::PerOption {
                per_correct: 0.5,
                per_incorrect: 0.0,
                max: 1.0,
                min: 0.0,
            },
        },
        AnswerKeyEntry {
            question: "Q3".into(),
            correct: vec!["B".into()],
            rule: KeyRule::Exact { points: 2.0 },
        },
    ])
    .unwrap();
    let mut s = student("S1", ["1", "0", "0"]);
    let marks = remark(&key, &mut s).unwrap();

    assert_eq!(marks, vec![1.0, 0.5, 0.0]);
    assert_eq!(s.recomputed_total, Some(1.5));
}
