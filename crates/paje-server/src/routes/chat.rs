use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use futures::{stream::StreamExt, Stream};
use paje::models::chat::ChatMessage;
use paje::presenter::{typing_stream, TypingEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const MISSING_MESSAGE: &str = "Mensagem é obrigatória";
const MISSING_API_KEY: &str = "Chave da API Anthropic não configurada";
const INTERNAL_ERROR: &str = "Erro interno do servidor";
const HEALTH_MESSAGE: &str = "API do Chat está funcionando";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// A request rejected before any orchestration starts
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn missing_message() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: MISSING_MESSAGE,
        }
    }

    fn missing_api_key() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: MISSING_API_KEY,
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message.to_string(),
        });
        (self.status, body).into_response()
    }
}

// Server-sent events body fed by the typing presenter
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = axum::body::Body::from_stream(self);
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            body,
        )
            .into_response()
    }
}

fn format_event(event: &TypingEvent) -> Result<String, serde_json::Error> {
    Ok(format!("data: {}\n\n", serde_json::to_string(event)?))
}

/// A present, non-blank message
fn required_text(text: Option<String>) -> Result<String, ApiError> {
    text.filter(|text| !text.trim().is_empty())
        .ok_or_else(ApiError::missing_message)
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<SseResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "rejected chat request body");
        ApiError::internal()
    })?;
    let message = required_text(request.message)?;
    let orchestrator = state.orchestrator.ok_or_else(ApiError::missing_api_key)?;
    let history = request.conversation_history;
    let delay = state.typing_delay;

    tracing::info!(history = history.len(), "chat request received");

    // Create channel for streaming
    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    // Spawn task to handle streaming
    tokio::spawn(async move {
        let answer = tokio::select! {
            answer = orchestrator.process(&message, &history) => answer,
            // Dropping the orchestration future abandons the provider call
            _ = tx.closed() => {
                tracing::info!("client disconnected before the reply was ready");
                return;
            }
        };

        let mut events = typing_stream(&answer, delay);
        while let Some(event) = events.next().await {
            let frame = match format_event(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("Error encoding typing event: {}", e);
                    break;
                }
            };
            if let Err(e) = tx.send(frame).await {
                tracing::debug!("Client went away mid-stream: {}", e);
                break;
            }
        }
    });

    Ok(SseResponse::new(stream))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "message": HEALTH_MESSAGE,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

// simple ask for a response, non streaming
async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "rejected ask request body");
        ApiError::internal()
    })?;
    let prompt = required_text(request.prompt)?;
    let orchestrator = state.orchestrator.ok_or_else(ApiError::missing_api_key)?;

    let response = orchestrator.process(&prompt, &[]).await;
    Ok(Json(AskResponse { response }))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler).get(health_handler))
        .route("/api/ask", post(ask_handler))
        .with_state(state)
}
