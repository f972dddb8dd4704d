// src/server/routes.rs

use std::path::{Component, Path, PathBuf};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use super::ServerState;

pub const LIVERELOAD_PATH: &str = "/__sitepipe/livereload";
pub const CLIENT_PATH: &str = "/__sitepipe/client.js";

const CLIENT_JS: &str = include_str!("client.js");

/// Insert the live-reload client before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..at]);
            out.push_str(&tag);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

pub async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], CLIENT_JS)
}

pub async fn livereload(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (mut sender, mut receiver) = socket.split();
    let mut reload_rx = state.reload.subscribe();
    debug!(clients = state.reload.client_count(), "live-reload client connected");

    loop {
        tokio::select! {
            msg = reload_rx.recv() => {
                match msg {
                    Ok(msg) => {
                        let Ok(json) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("live-reload client lagged, missed {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("live-reload client disconnected");
}

/// Map a request path to an HTML file below `base`, if it names one.
///
/// The path is percent-decoded first. Directory paths resolve to their
/// `index.html`. Paths with `..` never resolve.
fn html_target(base: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let rel = Path::new(decoded.trim_start_matches('/'));
    if rel.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
        return None;
    }
    let path = base.join(rel);
    if uri_path.ends_with('/') {
        return Some(path.join("index.html"));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => Some(path),
        _ => None,
    }
}

/// Static files from the base directory; HTML pages carry the client.
pub async fn serve_site(State(state): State<ServerState>, req: Request) -> Response {
    let uri_path = req.uri().path().to_string();
    if uri_path.split('/').any(|seg| seg == "..") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    if let Some(target) = html_target(&state.base, &uri_path) {
        if let Ok(page) = tokio::fs::read_to_string(&target).await {
            return Html(inject_client(&page)).into_response();
        }
    }

    match ServeDir::new(&state.base).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}
