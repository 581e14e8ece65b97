//! Console HTTP surface.
//!
//! GET  /              — demo page
//! GET  /api/state     — current display snapshot
//! POST /api/advance   — button press
//! POST /api/stop      — cancel a running demo
//! GET  /api/events    — server-sent snapshot stream
//! GET  /api/logging   — current logging level
//! PUT  /api/logging   — change logging level

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use sdwan_common::{LogLevel, Logger};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

use crate::display::DisplaySnapshot;
use crate::session::{DemoSession, StepResult};

#[derive(Clone)]
pub struct ConsoleState {
    pub session: DemoSession,
    pub logger: Logger,
}

pub fn router(state: ConsoleState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/advance", post(advance))
        .route("/api/stop", post(stop))
        .route("/api/events", get(events))
        .route("/api/logging", get(get_logging).put(set_logging))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    pub result: String,
    pub snapshot: DisplaySnapshot,
}

impl StepResponse {
    fn new(result: StepResult, applied: &str, ignored: &str) -> Self {
        let label = if result.applied { applied } else { ignored };
        Self {
            result: label.to_string(),
            snapshot: result.snapshot,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoggingBody {
    pub level: LogLevel,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn get_state(State(state): State<ConsoleState>) -> Json<DisplaySnapshot> {
    Json(state.session.snapshot().await)
}

async fn advance(State(state): State<ConsoleState>) -> Json<StepResponse> {
    let result = state.session.advance().await;
    Json(StepResponse::new(result, "applied", "ignored"))
}

async fn stop(State(state): State<ConsoleState>) -> Json<StepResponse> {
    let result = state.session.stop().await;
    Json(StepResponse::new(result, "stopped", "ignored"))
}

async fn events(
    State(state): State<ConsoleState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.session.subscribe()).map(|snapshot| {
        let event = Event::default()
            .event("state")
            .json_data(&snapshot)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn get_logging(State(state): State<ConsoleState>) -> Json<LoggingBody> {
    Json(LoggingBody {
        level: state.logger.level(),
    })
}

async fn set_logging(
    State(state): State<ConsoleState>,
    Json(body): Json<LoggingBody>,
) -> Json<LoggingBody> {
    state.logger.set_level(body.level);
    tracing::info!(level = %body.level, "logging level changed");
    Json(body)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>SD-WAN Demo</title>
<style>
body { font-family: sans-serif; margin: 2em; }
.btn { padding: 0.6em 1.4em; font-size: 1.1em; }
.btn.inactive { opacity: 0.5; }
.metric { display: inline-block; margin-right: 2em; }
</style></head>
<body>
<h1>SD-WAN Demo</h1>
<button id="btn" class="btn active">Start Test</button>
<button id="stop" class="btn">Stop</button>
<p id="statusText"></p>
<div class="metric">Packet loss: <span id="totalPacketLoss">0 %</span></div>
<div class="metric">Latency: <span id="totalLatency">0 ms</span></div>
<div class="metric">Jitter: <span id="totalJitter">0 ms</span></div>
<script>
function render(s) {
  const btn = document.getElementById('btn');
  btn.textContent = s.button_label;
  btn.className = s.enabled ? 'btn active' : 'btn inactive';
  document.getElementById('statusText').textContent = s.status_text;
  document.getElementById('totalPacketLoss').textContent = s.primary_packet_loss_text;
  document.getElementById('totalLatency').textContent = s.primary_latency_text;
  document.getElementById('totalJitter').textContent = s.primary_jitter_text;
}
document.getElementById('btn').addEventListener('click', () =>
  fetch('/api/advance', { method: 'POST' }).then(r => r.json()).then(r => render(r.snapshot)));
document.getElementById('stop').addEventListener('click', () =>
  fetch('/api/stop', { method: 'POST' }).then(r => r.json()).then(r => render(r.snapshot)));
fetch('/api/state').then(r => r.json()).then(render);
new EventSource('/api/events').addEventListener('state', e => render(JSON.parse(e.data)));
</script>
</body></html>"#;
