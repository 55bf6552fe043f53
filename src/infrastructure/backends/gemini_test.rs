use std::io::Read;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use mockito::Matcher;
use test_utils::gemini_stream_fixture;

use super::parse_event_line;
use super::Content;
use super::Gemini;
use super::GeminiConversation;
use super::GeminiSession;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ConfigurationError;
use crate::domain::models::Conversation;
use crate::domain::models::ConversationError;
use crate::domain::models::ConversationSession;

const STREAM_PATH: &str = r"^/v1beta/models/gemini-test:streamGenerateContent";

impl Gemini {
    fn with_url(url: String) -> Arc<Gemini> {
        return Arc::new(Gemini::new(
            &url,
            "abc",
            "models/gemini-test",
            Duration::from_millis(500),
        ));
    }
}

impl GeminiSession {
    async fn history(&self) -> Vec<Content> {
        return self.history.lock().await.clone();
    }
}

fn session(url: String) -> GeminiSession {
    return GeminiSession::new(Gemini::with_url(url), "Read carefully.".to_string());
}

#[test]
fn it_parses_event_lines() -> Result<()> {
    let fixture = gemini_stream_fixture(&["Hello \"there\""]);
    let line = fixture.lines().next().unwrap_or_default();

    assert_eq!(parse_event_line(line)?, Some("Hello \"there\"".to_string()));
    assert_eq!(parse_event_line("")?, None);
    assert_eq!(parse_event_line(": keep-alive")?, None);
    assert_eq!(parse_event_line("data: [DONE]")?, None);
    assert_eq!(
        parse_event_line(r#"data: {"candidates": [{"content": {"parts": [], "role": "model"}}]}"#)?,
        None
    );
    return Ok(());
}

#[test]
fn it_surfaces_errors_inside_events() {
    let res = parse_event_line(r#"data: {"error": {"code": 429, "message": "Slow down"}}"#);
    assert_eq!(
        res,
        Err(ConversationError::Status {
            status: 429,
            body: "Slow down".to_string()
        })
    );

    let res = parse_event_line("data: {not json");
    assert!(matches!(res, Err(ConversationError::InvalidResponse(_))));
}

#[test]
fn it_requires_a_credential() {
    Config::set(ConfigKey::GeminiToken, "");
    let res = Gemini::from_config();
    assert!(matches!(res, Err(ConfigurationError::MissingCredential)));
}

#[tokio::test]
async fn it_opens_a_session_after_checking_the_model() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1beta/models/gemini-test")
        .match_header("x-goog-api-key", "abc")
        .with_status(200)
        .with_body(r#"{"name": "models/gemini-test"}"#)
        .create_async()
        .await;

    let conversation = GeminiConversation::with_client(Gemini::with_url(server.url()));
    let session = conversation
        .open_session(&["a.pdf".to_string(), "b.pdf".to_string()], "X\n\n---\n\nY")
        .await?;

    let instruction = session.system_instruction();
    assert!(instruction.contains("The user has uploaded the following documents: a.pdf, b.pdf."));
    assert!(instruction.contains("---\nX\n\n---\n\nY\n---"));
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_open_a_session_for_a_missing_model() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1beta/models/gemini-test")
        .with_status(404)
        .with_body("model not found")
        .create_async()
        .await;

    let conversation = GeminiConversation::with_client(Gemini::with_url(server.url()));
    let res = conversation.open_session(&["a.pdf".to_string()], "X").await;

    match res {
        Err(err) => assert_eq!(
            err,
            ConversationError::Status {
                status: 404,
                body: "model not found".to_string()
            }
        ),
        Ok(_) => panic!("expected the model check to fail"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_to_open_a_session_when_unreachable() {
    let conversation =
        GeminiConversation::with_client(Gemini::with_url("http://127.0.0.1:1".to_string()));
    let res = conversation.open_session(&["a.pdf".to_string()], "X").await;
    assert!(matches!(res, Err(ConversationError::Transport(_))));
}

#[tokio::test]
async fn it_streams_fragments_and_records_history() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
        .match_header("x-goog-api-key", "abc")
        .match_body(Matcher::PartialJsonString(
            r#"{"systemInstruction": {"parts": [{"text": "Read carefully."}]}, "contents": [{"role": "user", "parts": [{"text": "Summarize"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(gemini_stream_fixture(&["Hello ", "World"]))
        .create_async()
        .await;

    let session = session(server.url());
    let fragments = session
        .send("Summarize")
        .await?
        .collect::<Vec<Result<String, ConversationError>>>()
        .await;

    assert_eq!(
        fragments,
        vec![Ok("Hello ".to_string()), Ok("World".to_string())]
    );

    let history = session.history().await;
    assert_eq!(
        history,
        vec![
            Content::text("user", "Summarize"),
            Content::text("model", "Hello World")
        ]
    );
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_sends_previous_turns_with_the_next_message() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
        .match_body(Matcher::Regex(
            r#""contents":\[\{"role":"user","parts":\[\{"text":"One"\}\]\}\]"#.to_string(),
        ))
        .with_status(200)
        .with_body(gemini_stream_fixture(&["First"]))
        .create_async()
        .await;
    let second = server
        .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
        .match_body(Matcher::Regex(
            r#""contents":\[\{"role":"user","parts":\[\{"text":"One"\}\]\},\{"role":"model","parts":\[\{"text":"First"\}\]\},\{"role":"user","parts":\[\{"text":"Two"\}\]\}\]"#.to_string(),
        ))
        .with_status(200)
        .with_body(gemini_stream_fixture(&["Second"]))
        .create_async()
        .await;

    let session = session(server.url());
    let _ = session.send("One").await?.collect::<Vec<_>>().await;
    let fragments = session.send("Two").await?.collect::<Vec<_>>().await;

    assert_eq!(fragments, vec![Ok("Second".to_string())]);
    assert_eq!(session.history().await.len(), 4);
    first.assert_async().await;
    second.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_rejects_a_second_send_while_streaming() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
        .with_status(200)
        .with_body(gemini_stream_fixture(&["Hello"]))
        .expect(2)
        .create_async()
        .await;

    let session = session(server.url());
    let stream = session.send("First").await?;

    let res = session.send("Second").await;
    assert!(matches!(res, Err(ConversationError::Busy)));

    drop(stream);
    assert!(session.history().await.is_empty());

    let fragments = session.send("Third").await?.collect::<Vec<_>>().await;
    assert_eq!(fragments, vec![Ok("Hello".to_string())]);
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_keeps_fragments_that_arrived_before_a_failure() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}data: {{not json\r\n\r\n",
        gemini_stream_fixture(&["Partial "])
    );
    let mock = server
        .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let session = session(server.url());
    let fragments = session.send("Summarize").await?.collect::<Vec<_>>().await;

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], Ok("Partial ".to_string()));
    assert!(matches!(
        fragments[1],
        Err(ConversationError::InvalidResponse(_))
    ));
    assert!(session.history().await.is_empty());
    assert!(!session.in_flight.load(std::sync::atomic::Ordering::SeqCst));
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_fails_on_a_non_success_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
        .with_status(500)
        .with_body("  upstream exploded  ")
        .create_async()
        .await;

    let session = session(server.url());
    let res = session.send("Summarize").await;

    match res {
        Err(err) => assert_eq!(
            err,
            ConversationError::Status {
                status: 500,
                body: "upstream exploded".to_string()
            }
        ),
        Ok(_) => panic!("expected the completion request to fail"),
    }
    assert!(!session.in_flight.load(std::sync::atomic::Ordering::SeqCst));
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_a_stream_that_goes_silent() -> Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}", listener.local_addr()?);
    std::thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            let mut buf = [0; 65536];
            let _ = socket.read(&mut buf);
            let _ = socket.write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n",
            );
            let _ = socket.flush();
            std::thread::sleep(Duration::from_secs(5));
        }
    });

    let session = session(url);
    let mut stream = session.send("Summarize").await?;
    let next = tokio::time::timeout(Duration::from_secs(3), stream.next()).await?;

    assert!(matches!(next, Some(Err(ConversationError::Transport(_)))));
    drop(stream);
    assert!(session.history().await.is_empty());
    assert!(!session.in_flight.load(std::sync::atomic::Ordering::SeqCst));
    return Ok(());
}
