#![allow(dead_code)]

use std::path::PathBuf;

/// One question block. Each option is one of "correct", "incorrect", "valid" or "".
pub struct Q<'a> {
    pub id: Option<&'a str>,
    pub options: &'a [&'a str],
    pub mark: &'a str,
}

pub fn q<'a>(id: &'a str, options: &'a [&'a str], mark: &'a str) -> Q<'a> {
    Q {
        id: Some(id),
        options,
        mark,
    }
}

pub fn page(student: &str, questions: &[Q]) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Result</title></head><body>\n");
    html.push_str(&format!(
        "<div ng-if=\"selectedParticipant &amp;&amp; !selectedGroup\"><div class=\"participant-name\">\n  {student}\n</div></div>\n"
    ));
    for q in questions {
        html.push_str(&question_block(q));
    }
    html.push_str("</body></html>\n");
    html
}

pub fn question_block(q: &Q) -> String {
    let mut s = match q.id {
        Some(id) => format!("<div class=\"lrn_widget\" data-reference=\"{id}\">"),
        None => "<div class=\"lrn_widget\">".to_string(),
    };
    s.push_str("<ul class=\"lrn-response-validate-wrapper\">");
    for (i, state) in q.options.iter().enumerate() {
        let class = match *state {
            "correct" => " lrn_correct",
            "incorrect" => " lrn_incorrect",
            "valid" => " lrn_valid",
            _ => "",
        };
        s.push_str(&format!(
            "<li class=\"lrn-mcq-option{class}\"><input type=\"checkbox\"><label>Option {i}</label></li>"
        ));
    }
    s.push_str("</ul>");
    s.push_str(&format!("<span class=\"lrn_score_value\">{}</span>", q.mark));
    s.push_str("</div>\n");
    s
}

/// Fresh, empty scratch directory for one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wiseflow-remark-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub fn write_input(dir: &std::path::Path, file: &str, html: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, html).expect("write input");
    path
}
