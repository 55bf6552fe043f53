use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_plain_message() {
    let text = "What does the contract say about /open office hours?";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_is_short_quit() {
    let cmd = SlashCommand::parse("/q").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_quit() {
    let cmd = SlashCommand::parse("/quit").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_exit() {
    let cmd = SlashCommand::parse("/exit").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_not_is_quit() {
    let cmd = SlashCommand::parse("/open a.pdf").unwrap();
    assert!(!cmd.is_quit());
}

#[test]
fn it_is_open() {
    let cmd = SlashCommand::parse("/open ./a.pdf ./b.pdf").unwrap();
    assert!(cmd.is_open());
    assert_eq!(cmd.args, vec!["./a.pdf".to_string(), "./b.pdf".to_string()]);
}
#[test]
fn it_is_short_open() {
    let cmd = SlashCommand::parse("/o a.pdf").unwrap();
    assert!(cmd.is_open());
}
#[test]
fn it_keeps_quoted_args_together() {
    let cmd = SlashCommand::parse("/open \"./My Reports/Q1 summary.pdf\"   b.pdf").unwrap();
    assert_eq!(
        cmd.args,
        vec!["./My Reports/Q1 summary.pdf".to_string(), "b.pdf".to_string()]
    );
}

#[test]
fn it_is_set() {
    let cmd = SlashCommand::parse("/set handbook").unwrap();
    assert!(cmd.is_set());
    assert!(!cmd.is_set_list());
    assert_eq!(cmd.args, vec!["handbook".to_string()]);
}
#[test]
fn it_is_short_set() {
    let cmd = SlashCommand::parse("/s 2").unwrap();
    assert!(cmd.is_set());
}
#[test]
fn it_is_set_list() {
    let cmd = SlashCommand::parse("/sets").unwrap();
    assert!(cmd.is_set_list());
    assert!(!cmd.is_set());
}

#[test]
fn it_is_clear() {
    let cmd = SlashCommand::parse("/clear").unwrap();
    assert!(cmd.is_clear());
}

#[test]
fn it_is_short_help() {
    let cmd = SlashCommand::parse("/h").unwrap();
    assert!(cmd.is_help());
}
#[test]
fn it_is_help() {
    let cmd = SlashCommand::parse("/help").unwrap();
    assert!(cmd.is_help());
}
