#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::stream::TryStreamExt;
use once_cell::sync::OnceCell;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::Lines;
use tokio::sync::Mutex;
use tokio::time;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::system_instruction;
use crate::domain::models::ConfigurationError;
use crate::domain::models::Conversation;
use crate::domain::models::ConversationError;
use crate::domain::models::ConversationSession;
use crate::domain::models::FragmentStream;
use crate::domain::models::SessionBox;

/// Constructed on first use and reused for the life of the process. A failed
/// configuration check stays failed until restart.
static CLIENT: OnceCell<Result<Arc<Gemini>, ConfigurationError>> = OnceCell::new();

/// Upper bound on how much of an error body ends up in a message.
const ERROR_BODY_LIMIT: usize = 300;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Content {
        return Content {
            role: role.to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

/// Reads one server sent event line. Returns the text carried by a `data:`
/// line, or `None` for anything that carries no text.
fn parse_event_line(line: &str) -> Result<Option<String>, ConversationError> {
    let trimmed = line.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(payload) => payload.trim(),
        None => return Ok(None),
    };
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    let res: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|err| return ConversationError::InvalidResponse(err.to_string()))?;

    if let Some(api_error) = res.error {
        return Err(ConversationError::Status {
            status: api_error.code,
            body: api_error.message,
        });
    }

    let text = res
        .candidates
        .first()
        .and_then(|candidate| return candidate.content.as_ref())
        .map(|content| {
            return content
                .parts
                .iter()
                .filter_map(|part| return part.text.clone())
                .collect::<Vec<String>>()
                .join("");
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Ok(None);
    }

    return Ok(Some(text));
}

fn idle_error(timeout: Duration) -> ConversationError {
    return ConversationError::Transport(format!(
        "Gemini sent nothing for {}ms",
        timeout.as_millis()
    ));
}

async fn status_error(res: reqwest::Response) -> ConversationError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();

    return ConversationError::Status {
        status,
        body: body.trim().chars().take(ERROR_BODY_LIMIT).collect(),
    };
}

pub struct Gemini {
    url: String,
    token: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl Gemini {
    pub fn new(url: &str, token: &str, model: &str, timeout: Duration) -> Gemini {
        return Gemini {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config() -> Result<Gemini, ConfigurationError> {
        let token = Config::get(ConfigKey::GeminiToken);
        if token.is_empty() {
            return Err(ConfigurationError::MissingCredential);
        }

        let url = Config::get(ConfigKey::GeminiURL);
        if url.is_empty() {
            return Err(ConfigurationError::InvalidValue {
                key: ConfigKey::GeminiURL.to_string(),
                value: url,
            });
        }

        let mut model = Config::get(ConfigKey::Model);
        if !model.starts_with("models/") {
            model = format!("models/{model}");
        }

        let timeout_str = Config::get(ConfigKey::RequestTimeout);
        let timeout = timeout_str.parse::<u64>().map_err(|_| {
            return ConfigurationError::InvalidValue {
                key: ConfigKey::RequestTimeout.to_string(),
                value: timeout_str.to_string(),
            };
        })?;

        return Ok(Gemini::new(
            &url,
            &token,
            &model,
            Duration::from_millis(timeout),
        ));
    }

    pub fn shared() -> Result<Arc<Gemini>, ConfigurationError> {
        return CLIENT
            .get_or_init(|| {
                let res = Gemini::from_config().map(Arc::new);
                if let Err(err) = &res {
                    tracing::error!(error = %err, "Gemini client is not configured");
                }
                return res;
            })
            .clone();
    }

    fn model_url(&self) -> String {
        return format!(
            "{url}/v1beta/{model}",
            url = self.url,
            model = self.model
        );
    }

    /// Confirms the endpoint is reachable and the model exists before a
    /// session is handed out.
    async fn check_model(&self) -> Result<(), ConversationError> {
        let res = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.token)
            .timeout(self.timeout)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Gemini is not reachable");
                return Err(ConversationError::Transport(err.to_string()));
            }
        };

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Gemini model check failed");
            return Err(status_error(res).await);
        }

        return Ok(());
    }

    async fn stream_completion(
        &self,
        req: &CompletionRequest,
    ) -> Result<reqwest::Response, ConversationError> {
        let pending = self
            .client
            .post(format!(
                "{model_url}:streamGenerateContent?alt=sse",
                model_url = self.model_url()
            ))
            .header("x-goog-api-key", &self.token)
            .json(req)
            .send();

        let res = match time::timeout(self.timeout, pending).await {
            Ok(res) => res.map_err(|err| return ConversationError::Transport(err.to_string()))?,
            Err(_) => return Err(idle_error(self.timeout)),
        };

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Gemini"
            );
            return Err(status_error(res).await);
        }

        return Ok(res);
    }
}

/// Clears the session's in-flight flag when the reply stream goes away,
/// whether it finished, failed or was dropped half way.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

struct PendingTurn {
    message: String,
    reply: String,
    idle_timeout: Duration,
    history: Arc<Mutex<Vec<Content>>>,
    _in_flight: InFlightGuard,
}

impl PendingTurn {
    async fn commit(&self) {
        let mut history = self.history.lock().await;
        history.push(Content::text("user", &self.message));
        history.push(Content::text("model", &self.reply));
    }
}

async fn next_fragment<R>(
    lines: &mut Lines<R>,
    turn: &mut PendingTurn,
) -> Result<Option<String>, ConversationError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let line = match time::timeout(turn.idle_timeout, lines.next_line()).await {
            Ok(line) => line.map_err(|err| return ConversationError::Transport(err.to_string()))?,
            Err(_) => {
                tracing::error!(timeout_ms = %turn.idle_timeout.as_millis(), "Gemini stream stalled");
                return Err(idle_error(turn.idle_timeout));
            }
        };

        let line = match line {
            Some(line) => line,
            None => {
                turn.commit().await;
                return Ok(None);
            }
        };

        if let Some(text) = parse_event_line(&line)? {
            turn.reply.push_str(&text);
            return Ok(Some(text));
        }
    }
}

fn fragment_stream<R>(lines: Lines<R>, turn: PendingTurn) -> FragmentStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let fragments = stream::try_unfold((lines, turn), |(mut lines, mut turn)| async move {
        let res = next_fragment(&mut lines, &mut turn).await;
        return res.map(|fragment| return fragment.map(|text| return (text, (lines, turn))));
    });

    return Box::pin(fragments);
}

pub struct GeminiSession {
    client: Arc<Gemini>,
    instruction: String,
    history: Arc<Mutex<Vec<Content>>>,
    in_flight: Arc<AtomicBool>,
}

impl GeminiSession {
    fn new(client: Arc<Gemini>, instruction: String) -> GeminiSession {
        return GeminiSession {
            client,
            instruction,
            history: Arc::new(Mutex::new(vec![])),
            in_flight: Arc::new(AtomicBool::new(false)),
        };
    }
}

#[async_trait]
impl ConversationSession for GeminiSession {
    fn system_instruction(&self) -> &str {
        return &self.instruction;
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, message: &str) -> Result<FragmentStream, ConversationError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ConversationError::Busy);
        }
        let guard = InFlightGuard {
            flag: self.in_flight.clone(),
        };

        let mut contents = self.history.lock().await.clone();
        contents.push(Content::text("user", message));

        let req = CompletionRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: Some(self.instruction.to_string()),
                }],
            },
            contents,
        };

        let res = self.client.stream_completion(&req).await?;
        let lines = StreamReader::new(res.bytes_stream().map_err(convert_err)).lines();

        return Ok(fragment_stream(
            lines,
            PendingTurn {
                message: message.to_string(),
                reply: "".to_string(),
                idle_timeout: self.client.timeout,
                history: self.history.clone(),
                _in_flight: guard,
            },
        ));
    }
}

/// Opens Gemini sessions. Without an explicit client the process wide one is
/// used, so a missing credential surfaces on the first session open.
#[derive(Default)]
pub struct GeminiConversation {
    client: Option<Arc<Gemini>>,
}

impl GeminiConversation {
    pub fn with_client(client: Arc<Gemini>) -> GeminiConversation {
        return GeminiConversation {
            client: Some(client),
        };
    }

    fn client(&self) -> Result<Arc<Gemini>, ConversationError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        return Ok(Gemini::shared()?);
    }
}

#[async_trait]
impl Conversation for GeminiConversation {
    #[allow(clippy::implicit_return)]
    async fn open_session(
        &self,
        file_names: &[String],
        document_text: &str,
    ) -> Result<SessionBox, ConversationError> {
        let client = self.client()?;
        client.check_model().await?;

        let instruction = system_instruction(file_names, document_text);
        tracing::info!(
            files = file_names.len(),
            instruction_chars = instruction.len(),
            model = %client.model,
            "opened Gemini session"
        );

        return Ok(Arc::new(GeminiSession::new(client, instruction)));
    }
}
