use wiseflow_remark::{
    config::{Config, KeyRule},
    marking,
};

#[test]
fn parse_example_config() {
    let raw = include_str!("../wiseflow-remark.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.marking.scheme, "answer_key");
    assert_eq!(cfg.marking.answer_key.len(), 2);
    assert_eq!(
        cfg.marking.answer_key[1].rule,
        KeyRule::PerOption {
            per_correct: 0.5,
            per_incorrect: 0.0,
            max: 1.0,
            min: 0.0
        }
    );
    assert!(cfg.security.reject_url_inputs);
    assert!(marking::from_config(&cfg.marking).is_ok());
}

#[test]
fn empty_config_uses_defaults() {
    let cfg: Config = toml::from_str("").expect("parse TOML");
    assert_eq!(cfg.marking.scheme, "wiseflow_example");
    assert_eq!(cfg.markers.option, "li.lrn-mcq-option");
    assert!(cfg.output.overwrite);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg: Config = toml::from_str("[markers]\nmark = \"span.score\"\n").expect("parse TOML");
    assert_eq!(cfg.markers.mark, "span.score");
    assert_eq!(cfg.markers.question, "div.lrn_widget");
}

#[test]
fn answer_key_rule_defaults_to_exact_one_point() {
    let raw = "[marking]\nscheme = \"answer_key\"\n[[marking.answer_key]]\nquestion = \"Q1\"\ncorrect = [\"C\"]\n";
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.marking.answer_key[0].rule, KeyRule::Exact { points: 1.0 });
}

#[test]
fn answer_key_scheme_without_entries_is_rejected() {
    let cfg: Config = toml::from_str("[marking]\nscheme = \"answer_key\"\n").expect("parse TOML");
    assert!(marking::from_config(&cfg.marking).is_err());
}
