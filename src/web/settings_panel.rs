//! Local settings panel routes
//!
//! - `GET /` settings form and the raw document
//! - `POST /save` merge the submitted form into `settings.json`
//! - `GET /api/settings` current settings as JSON
//! - `GET /logs` recent log lines
//! - `GET /logs/stream` live log lines over SSE

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, info};

use crate::logging::SharedLogBuffer;
use crate::state::{Settings, SettingsForm, SettingsRepository};

const PAGE_STYLE: &str = r#"<style>
  * { box-sizing: border-box; }
  body { margin: 0; font-family: system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif; background: #0f1220; color: #e7e7f0; }
  header { padding: 16px 24px; border-bottom: 1px solid #2a2f45; display: flex; gap: 16px; align-items: center; }
  header h1 { font-size: 18px; margin: 0; }
  header a { color: #9aa0b4; }
  main { max-width: 860px; margin: 24px auto; padding: 0 16px 48px; }
  .card { background: #171a2b; border: 1px solid #2a2f45; border-radius: 12px; padding: 20px; margin-bottom: 16px; }
  label { display: block; font-weight: 600; margin: 10px 0 6px; color: #9aa0b4; }
  input { width: 100%; padding: 10px 12px; background: #0e1020; color: #e7e7f0; border: 1px solid #2a2f45; border-radius: 8px; }
  .hint { font-size: 12px; color: #9aa0b4; margin-top: 4px; }
  .notice { color: #2ecc71; margin-bottom: 12px; }
  .notice.error { color: #e74c3c; }
  button { margin-top: 18px; background: #7c5cff; color: white; border: 0; border-radius: 8px; padding: 10px 16px; font-weight: 600; cursor: pointer; }
  pre { font-family: ui-monospace, Menlo, Consolas, monospace; white-space: pre-wrap; background: #0e1020; border: 1px solid #2a2f45; border-radius: 10px; padding: 12px; }
  .log .WARN { color: #f39c12; } .log .ERROR { color: #e74c3c; } .log .DEBUG, .log .TRACE { color: #9aa0b4; }
</style>"#;

#[derive(Clone)]
pub struct PanelState {
    pub settings: SettingsRepository,
    pub log_buffer: SharedLogBuffer,
}

pub fn panel_router(state: PanelState) -> Router {
    Router::new()
        .route("/", get(settings_page))
        .route("/save", post(save_settings))
        .route("/api/settings", get(settings_json))
        .route("/logs", get(logs_page))
        .route("/logs/stream", get(logs_stream))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    saved: Option<String>,
    error: Option<String>,
}

/// GET / - settings form
async fn settings_page(
    State(state): State<PanelState>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let settings = state.settings.load().await.unwrap_or_default();
    let notice = match (&query.saved, &query.error) {
        (_, Some(err)) => format!(r#"<div class="notice error">{}</div>"#, html_escape(err)),
        (Some(_), None) => r#"<div class="notice">Settings saved.</div>"#.to_string(),
        _ => String::new(),
    };
    Html(render_settings_page(&settings, &notice))
}

/// POST /save - merge the form into the stored settings
async fn save_settings(
    State(state): State<PanelState>,
    Form(form): Form<SettingsForm>,
) -> Redirect {
    match state.settings.update(|s| s.apply_form(&form)).await {
        Ok(saved) => {
            info!(
                "Settings saved from panel (results channel {:?}, {} results role(s), queue role {:?})",
                saved.results_channel,
                saved.results_roles.len(),
                saved.queue_role
            );
            Redirect::to("/?saved=1")
        }
        Err(e) => {
            error!("Failed to save settings from panel: {}", e);
            Redirect::to("/?error=Failed+to+save+settings")
        }
    }
}

/// GET /api/settings
async fn settings_json(State(state): State<PanelState>) -> Response {
    match state.settings.load().await {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => {
            error!("Failed to load settings: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load settings").into_response()
        }
    }
}

/// GET /logs - recent captured log lines
async fn logs_page(State(state): State<PanelState>) -> Html<String> {
    let lines: String = state
        .log_buffer
        .recent(200)
        .iter()
        .map(|line| {
            format!(
                r#"<div class="{}">{}</div>"#,
                line.level,
                html_escape(&line.format())
            )
        })
        .collect();

    Html(format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Logs - Tierbot</title>
  {style}
</head>
<body>
  <header><h1>Logs</h1><a href="/">Settings</a></header>
  <main>
    <div class="card log" id="log">{lines}</div>
  </main>
  <script>
    const log = document.getElementById('log');
    const source = new EventSource('/logs/stream');
    source.onmessage = (e) => {{
      const line = JSON.parse(e.data);
      const div = document.createElement('div');
      div.className = line.level;
      div.textContent = `${{line.timestamp}} ${{line.level}} ${{line.target}}: ${{line.message}}`;
      log.appendChild(div);
      window.scrollTo(0, document.body.scrollHeight);
    }};
  </script>
</body>
</html>"#,
        style = PAGE_STYLE,
        lines = lines
    ))
}

/// GET /logs/stream - new log lines as SSE
async fn logs_stream(State(state): State<PanelState>) -> impl IntoResponse {
    let stream = BroadcastStream::new(state.log_buffer.subscribe()).filter_map(|line| {
        // Lagged receivers skip what they missed
        let line = line.ok()?;
        let data = serde_json::to_string(&line).ok()?;
        Some(Ok::<_, Infallible>(Event::default().data(data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn id_value(id: Option<u64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

fn render_settings_page(settings: &Settings, notice: &str) -> String {
    let raw = serde_json::to_string_pretty(settings).unwrap_or_else(|_| "{}".to_string());
    let roles = settings
        .results_roles
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Tierbot Configuration</title>
  {style}
</head>
<body>
  <header><h1>Tierbot Configuration</h1><a href="/logs">Logs</a></header>
  <main>
    {notice}
    <form class="card" method="POST" action="/save">
      <label for="results_channel">Results channel ID</label>
      <input id="results_channel" name="results_channel" value="{results_channel}" placeholder="123456789012345678" />
      <div class="hint">Text channel that /results posts into.</div>

      <label for="results_roles">Results roles</label>
      <input id="results_roles" name="results_roles" value="{results_roles}" placeholder="<@&123>, 456" />
      <div class="hint">Comma separated role ids or mentions. Empty allows everyone.</div>

      <label for="queue_role">Queue tester role</label>
      <input id="queue_role" name="queue_role" value="{queue_role}" />
      <div class="hint">Role allowed to join tester queues. Blank keeps the current value.</div>

      <label for="queue_category">Queue category ID</label>
      <input id="queue_category" name="queue_category" value="{queue_category}" />

      <label for="staff_role">Staff role</label>
      <input id="staff_role" name="staff_role" value="{staff_role}" />

      <button type="submit">Save</button>
    </form>
    <div class="card">
      <label>settings.json</label>
      <pre>{raw}</pre>
    </div>
  </main>
</body>
</html>"#,
        style = PAGE_STYLE,
        notice = notice,
        results_channel = id_value(settings.results_channel),
        results_roles = html_escape(&roles),
        queue_role = id_value(settings.queue_role),
        queue_category = id_value(settings.queue_category),
        staff_role = id_value(settings.staff_role),
        raw = html_escape(&raw),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::create_log_buffer;

    fn state(dir: &tempfile::TempDir) -> PanelState {
        PanelState {
            settings: SettingsRepository::new(dir.path().join("settings.json")),
            log_buffer: create_log_buffer(16),
        }
    }

    #[tokio::test]
    async fn test_save_merges_form() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state
            .settings
            .save(&Settings {
                results_channel: Some(1),
                queue_role: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();

        let form = SettingsForm {
            results_roles: "<@&20>, 21".to_string(),
            queue_role: "<@&30>".to_string(),
            ..Default::default()
        };
        save_settings(State(state.clone()), Form(form)).await;

        let saved = state.settings.load().await.unwrap();
        assert_eq!(saved.results_channel, Some(1));
        assert_eq!(saved.results_roles, vec![20, 21]);
        assert_eq!(saved.queue_role, Some(30));
    }

    #[test]
    fn test_page_escapes_values() {
        let settings = Settings {
            results_channel: Some(7),
            results_roles: vec![1, 2],
            ..Default::default()
        };
        let page = render_settings_page(&settings, "");
        assert!(page.contains(r#"value="7""#));
        assert!(page.contains(r#"value="1, 2""#));
        assert!(page.contains("&quot;results_channel&quot;: 7"));
    }
}
