use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub markers: Markers,
    #[serde(default)]
    pub marking: Marking,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub fail_fast: bool,
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            fail_fast: false,
            print_summary: true,
        }
    }
}

/// Where the exporter's markup keeps each piece of data. Wiseflow changes its
/// layout between versions, so all of it is overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub student: String,
    pub student_attr: String,
    pub student_attr_pattern: String,
    pub student_inner: String,
    pub question: String,
    pub question_id_attr: String,
    pub option_list: String,
    pub option: String,
    pub mark: String,
    pub class_correct: String,
    pub class_incorrect: String,
    pub class_valid: String,
}
impl Default for Markers {
    fn default() -> Self {
        Self {
            student: "div[ng-if]".into(),
            student_attr: "ng-if".into(),
            student_attr_pattern: "selectedParticipant.*!selectedGroup".into(),
            student_inner: "div".into(),
            question: "div.lrn_widget".into(),
            question_id_attr: "data-reference".into(),
            option_list: "ul.lrn-response-validate-wrapper".into(),
            option: "li.lrn-mcq-option".into(),
            mark: ".lrn_score_value".into(),
            class_correct: "lrn_correct".into(),
            class_incorrect: "lrn_incorrect".into(),
            class_valid: "lrn_valid".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Marking {
    pub scheme: String,
    pub answer_key: Vec<AnswerKeyEntry>,
}
impl Default for Marking {
    fn default() -> Self {
        Self {
            scheme: "wiseflow_example".into(),
            answer_key: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub question: String,
    pub correct: Vec<String>,
    #[serde(default)]
    pub rule: KeyRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyRule {
    Exact {
        #[serde(default = "one")]
        points: f64,
    },
    PerOption {
        per_correct: f64,
        #[serde(default)]
        per_incorrect: f64,
        #[serde(default = "one")]
        max: f64,
        #[serde(default)]
        min: f64,
    },
}
impl Default for KeyRule {
    fn default() -> Self {
        KeyRule::Exact { points: 1.0 }
    }
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    /// Directory for per-student CSVs. Empty means next to the summary file.
    pub student_dir: String,
    pub overwrite: bool,
    pub write_report_json: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            student_dir: "".into(),
            overwrite: true,
            write_report_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Postprocess {
    pub normalize_unicode: bool,
    pub collapse_whitespace: bool,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            collapse_whitespace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
