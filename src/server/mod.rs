// src/server/mod.rs

//! Static dev server with live reload.
//!
//! Files are served from `server.base_dir`. HTML pages get a small client
//! script that listens on a websocket for [`ReloadMessage`]s published through
//! the [`ReloadHub`].

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::tasks::TaskContext;

pub mod reload;
pub mod routes;

pub use reload::{ReloadHub, ReloadMessage};

#[derive(Debug, Clone)]
pub struct ServerState {
    pub base: PathBuf,
    pub reload: ReloadHub,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(routes::LIVERELOAD_PATH, get(routes::livereload))
        .route(routes::CLIENT_PATH, get(routes::client_script))
        .fallback(routes::serve_site)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve in the background.
pub async fn spawn_server(ctx: &TaskContext) -> Result<(SocketAddr, JoinHandle<()>)> {
    let cfg = &ctx.config.server;
    let listener = TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .with_context(|| format!("binding dev server to {}:{}", cfg.host, cfg.port))?;
    let addr = listener.local_addr()?;

    let state = ServerState {
        base: ctx.path(&cfg.base_dir),
        reload: ctx.reload.clone(),
    };
    let app = router(state);

    info!(addr = %addr, url = %cfg.start_url(), "dev server listening");
    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("dev server stopped: {err}");
        }
    });
    Ok((addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state(dir: &tempfile::TempDir) -> ServerState {
        ServerState {
            base: dir.path().to_path_buf(),
            reload: ReloadHub::new(Duration::ZERO),
        }
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn html_pages_carry_the_client() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(
            dir.path().join("public/index.html"),
            "<!DOCTYPE html><html><body>hi</body></html>",
        )
        .unwrap();

        let (status, body) = get_body(router(state(&dir)), "/public/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<script src=\"/__sitepipe/client.js\"></script></body>"));

        let (_, body) = get_body(router(state(&dir)), "/public/").await;
        assert!(body.contains("__sitepipe/client.js"));
    }

    #[tokio::test]
    async fn encoded_page_names_still_carry_the_client() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public/my page.html"), "<body>x</body>").unwrap();

        let (status, body) = get_body(router(state(&dir)), "/public/my%20page.html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("__sitepipe/client.js"));
    }

    #[tokio::test]
    async fn other_files_are_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.css"), "body{}").unwrap();

        let (status, body) = get_body(router(state(&dir)), "/main.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body{}");

        let (status, _) = get_body(router(state(&dir)), "/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn client_script_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_body(router(state(&dir)), "/__sitepipe/client.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/__sitepipe/livereload"));
    }
}
