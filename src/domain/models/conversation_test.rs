use test_utils::insta_snapshot;

use super::system_instruction;

#[test]
fn it_builds_the_system_instruction() {
    let instruction = system_instruction(
        &["a.pdf".to_string(), "b.pdf".to_string()],
        "X\n\n---\n\nY",
    );

    insta_snapshot(|| {
        insta::assert_snapshot!("system_instruction", instruction);
    });
}

#[test]
fn it_embeds_names_and_text_verbatim() {
    let instruction = system_instruction(&["report.pdf".to_string()], "Line one\n\nLine two");

    assert!(instruction.contains("the following documents: report.pdf."));
    assert!(instruction.contains("---\nLine one\n\nLine two\n---"));
}

#[test]
fn it_uses_a_placeholder_without_files() {
    let instruction = system_instruction(&[], "");
    assert!(instruction.contains("the following documents: No documents uploaded."));
}
