// src/serve/static_server.rs

//! Static HTTP dev server.
//!
//! Every request is answered through [`ServeSpec::resolve`]: routes first,
//! then the base directories in order.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::serve::{DevServer, ServeSpec};

#[derive(Debug)]
struct ServeState {
    spec: ServeSpec,
    fs: Arc<dyn FileSystem>,
}

/// Serves the working tree on `127.0.0.1:<port>`.
#[derive(Debug)]
pub struct StaticDevServer {
    fs: Arc<dyn FileSystem>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl StaticDevServer {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            local_addr: Mutex::new(None),
        }
    }

    /// Address the server is listening on, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(|p| p.into_inner())
    }
}

pub fn create_router(spec: ServeSpec, fs: Arc<dyn FileSystem>) -> Router {
    Router::new()
        .fallback(serve_file)
        .with_state(Arc::new(ServeState { spec, fs }))
}

impl DevServer for StaticDevServer {
    /// Binds synchronously so a taken port fails `develop` right away, then
    /// serves on the current Tokio runtime.
    fn start(&self, spec: &ServeSpec) -> Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, spec.port));
        let listener = std::net::TcpListener::bind(addr)
            .with_context(|| format!("binding dev server to {addr}"))?;
        listener.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(listener)?;
        let bound = listener.local_addr()?;
        *self.local_addr.lock().unwrap_or_else(|p| p.into_inner()) = Some(bound);

        let router = create_router(spec.clone(), Arc::clone(&self.fs));
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                warn!(error = %err, "dev server stopped");
            }
        });

        info!(
            url = %format!("http://{bound}"),
            base_dirs = ?spec.base_dirs,
            routes = ?spec.routes,
            reload = %spec.reload.glob(),
            "dev server ready"
        );
        Ok(())
    }

    fn reload(&self, path: &Path) {
        info!(path = ?path, "reload");
    }
}

async fn serve_file(State(state): State<Arc<ServeState>>, uri: Uri) -> Response {
    let url_path = uri.path().to_string();
    let lookup = {
        let url_path = url_path.clone();
        tokio::task::spawn_blocking(move || {
            let path = state.spec.resolve(&url_path, state.fs.as_ref())?;
            Some(state.fs.read(&path).map(|bytes| (path, bytes)))
        })
        .await
    };

    match lookup {
        Ok(Some(Ok((path, bytes)))) => {
            debug!(url = %url_path, file = ?path, "served");
            ([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response()
        }
        Ok(None) => {
            debug!(url = %url_path, "not found");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
        Ok(Some(Err(err))) => {
            warn!(url = %url_path, error = %err, "failed to read file");
            (StatusCode::INTERNAL_SERVER_ERROR, "read failed").into_response()
        }
        Err(err) => {
            warn!(url = %url_path, error = %err, "file lookup did not complete");
            (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed").into_response()
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("a/index.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("site.css")), "text/css; charset=utf-8");
        assert_eq!(content_type_for(Path::new("font.woff2")), "font/woff2");
        assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
    }
}
