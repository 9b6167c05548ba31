//! Minimal static file server for trying the import page locally.

use super::util::runtime;
use anyhow::{Context as _, Result};
use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Args;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Args)]
pub struct ServeArgs {
    /// Directory to serve
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Port on 127.0.0.1; 0 picks a free one
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Open the served URL in the default browser
    #[arg(long)]
    pub open: bool,
    /// Path to open with --open, relative to the root
    #[arg(long, default_value = "")]
    pub page: String,
}

pub fn run(args: ServeArgs) -> Result<()> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("serving {}", args.root.display()))?;
    runtime()?.block_on(serve(root, args.port, args.open.then_some(args.page)))
}

async fn serve(root: PathBuf, port: u16, open_page: Option<String>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
        .await
        .with_context(|| format!("binding 127.0.0.1:{port}"))?;
    let addr = listener.local_addr()?;
    let url = format!("http://{addr}/");
    println!("Serving {} at {url}", root.display());
    if let Some(page) = open_page {
        let target = format!("{url}{}", page.trim_start_matches('/'));
        if let Err(err) = open::that(&target) {
            warn!(target: "insight::serve", %err, url = %target, "failed to open browser");
        }
    }
    axum::serve(listener, router(root))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server exited with error")?;
    Ok(())
}

pub fn router(root: PathBuf) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/{*path}", get(file))
        .with_state(Arc::new(root))
}

async fn index(State(root): State<Arc<PathBuf>>) -> Response {
    respond(&root, "").await
}

async fn file(State(root): State<Arc<PathBuf>>, UrlPath(path): UrlPath<String>) -> Response {
    respond(&root, &path).await
}

enum Resolved {
    File(PathBuf),
    Forbidden,
    NotFound,
}

/// Map a decoded request path onto the root without letting it climb out.
fn resolve_in_root(root: &Path, request: &str) -> Resolved {
    let mut rel = PathBuf::new();
    for part in request.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if !rel.pop() {
                    return Resolved::Forbidden;
                }
            }
            seg => {
                let mut comps = Path::new(seg).components();
                match (comps.next(), comps.next()) {
                    (Some(Component::Normal(c)), None) => rel.push(c),
                    _ => return Resolved::Forbidden,
                }
            }
        }
    }
    let candidate = root.join(&rel);
    let Ok(real) = candidate.canonicalize() else {
        return Resolved::NotFound;
    };
    if !real.starts_with(root) {
        return Resolved::Forbidden;
    }
    if real.is_dir() {
        let index = real.join("index.html");
        return if index.is_file() {
            Resolved::File(index)
        } else {
            Resolved::NotFound
        };
    }
    Resolved::File(real)
}

async fn respond(root: &Path, request: &str) -> Response {
    match resolve_in_root(root, request) {
        Resolved::Forbidden => {
            warn!(target: "insight::serve", path = request, "path escapes root");
            plain(StatusCode::FORBIDDEN, "Forbidden")
        }
        Resolved::NotFound => plain(StatusCode::NOT_FOUND, "Not found"),
        Resolved::File(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                info!(target: "insight::serve", path = %path.display(), "200");
                ([(header::CONTENT_TYPE, content_type(&path))], Body::from(bytes)).into_response()
            }
            Err(err) => {
                error!(target: "insight::serve", path = %path.display(), %err, "read failed");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        },
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(target: "insight::serve", %err, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!(target: "insight::serve", "shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn site() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("site");
        std::fs::create_dir_all(root.join("import")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(root.join("import/index.html"), "<h1>import</h1>").unwrap();
        std::fs::write(root.join("import/main.mjs"), "export {};").unwrap();
        std::fs::write(root.join("data.bin"), [0u8, 1, 2]).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), "top secret").unwrap();
        let root = root.canonicalize().unwrap();
        (tmp, root)
    }

    async fn get(root: &Path, uri: &str) -> (StatusCode, String, String) {
        let response = router(root.to_path_buf())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let ctype = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, ctype, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn root_and_directories_serve_index() {
        let (_tmp, root) = site();
        let (status, ctype, body) = get(&root, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ctype, "text/html; charset=utf-8");
        assert_eq!(body, "<h1>home</h1>");

        let (status, _, body) = get(&root, "/import/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>import</h1>");
    }

    #[tokio::test]
    async fn content_types_follow_extension() {
        let (_tmp, root) = site();
        let (_, ctype, _) = get(&root, "/import/main.mjs").await;
        assert_eq!(ctype, "text/javascript; charset=utf-8");
        let (_, ctype, _) = get(&root, "/data.bin").await;
        assert_eq!(ctype, "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_paths_are_404() {
        let (_tmp, root) = site();
        assert_eq!(get(&root, "/nope.html").await.0, StatusCode::NOT_FOUND);
        // A directory without index.html.
        let (status, ctype, body) = get(&root, "/empty/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(ctype, "text/plain; charset=utf-8");
        assert_eq!(body, "Not found");
    }

    #[tokio::test]
    async fn escaping_the_root_is_forbidden() {
        let (_tmp, root) = site();
        for uri in ["/../secret.txt", "/import/../../secret.txt", "/%2e%2e/secret.txt"] {
            let (status, _, body) = get(&root, uri).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body, "Forbidden");
        }
        // Climbing back down inside the root stays allowed.
        let (status, _, body) = get(&root, "/import/../index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>home</h1>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_out_of_root_are_forbidden() {
        let (tmp, root) = site();
        std::os::unix::fs::symlink(tmp.path().join("secret.txt"), root.join("leak.txt")).unwrap();
        assert_eq!(get(&root, "/leak.txt").await.0, StatusCode::FORBIDDEN);
    }
}
