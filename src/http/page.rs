//! Playground page and status endpoint.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

const INDEX_TEMPLATE: &str = include_str!("../../assets/index.html");

/// Snippet shown when no gist is requested.
pub const DEFAULT_SNIPPET: &str = r#"package main

import (
	"errors"
	"fmt"
)

// Both results are optional: exactly one of them is set.
func parity(n int) (string \ error) {
	if n < 0 {
		return \ errors.New("negative input")
	}
	if n%2 == 0 {
		return "even" \
	}
	return "odd" \
}

func main() {
	s \ err := parity(7)
	if err != nil {
		fmt.Println("error:", err)
		return
	}
	fmt.Println("7 is", s)
}
"#;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub gist: Option<String>,
}

/// `GET /`
pub async fn index_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Html<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = if state.secure { "wss" } else { "ws" };
    let ws_url = format!("{}://{}/ws", scheme, host);

    Html(render_index(&ws_url, params.gist.as_deref().unwrap_or("")))
}

/// Fill the page template. A gist replaces the default snippet.
pub fn render_index(ws_url: &str, gist: &str) -> String {
    let preloaded = if gist.is_empty() { DEFAULT_SNIPPET } else { "" };

    INDEX_TEMPLATE
        .replace("{{WS_URL}}", &script_literal(ws_url))
        .replace("{{GIST}}", &script_literal(gist))
        .replace("{{PRELOADED_CODE}}", &escape_html(preloaded))
}

/// A JSON string literal safe to embed in an inline script.
fn script_literal(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub version: String,
    pub status: String,
    pub active_connections: u64,
    pub queue_depth: usize,
}

/// `GET /status`
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        active_connections: state.connections.active_count(),
        queue_depth: state.queue.depth(),
    })
}
