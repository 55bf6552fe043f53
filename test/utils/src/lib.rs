use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

pub fn manifest_fixture() -> &'static str {
    return r#"
{
  "documentSets": {
    "handbook": {
      "name": "Employee Handbook",
      "files": ["/docs/handbook/Part One.pdf", "/docs/handbook/part-two.pdf"]
    },
    "empty": {
      "name": "Nothing Yet",
      "files": []
    },
    "contracts": {
      "name": "Contracts",
      "files": ["/docs/contracts/a.pdf", "/docs/contracts/b.pdf", "/docs/contracts/c.pdf"]
    }
  }
}
"#
    .trim();
}

/// Server sent events body streamed back by `streamGenerateContent?alt=sse`.
pub fn gemini_stream_fixture(fragments: &[&str]) -> String {
    return fragments
        .iter()
        .map(|fragment| {
            let escaped = fragment.replace('\\', "\\\\").replace('"', "\\\"");
            return format!(
                "data: {{\"candidates\": [{{\"content\": {{\"parts\": [{{\"text\": \"{escaped}\"}}],\"role\": \"model\"}},\"index\": 0}}]}}\r\n\r\n"
            );
        })
        .collect::<Vec<String>>()
        .join("");
}
