//! Development server with live reload support.
//!
//! ```text
//! initial build ──► bind HTTP (+ WS) ──► actors (watch → rebuild → reload)
//!                          │
//!                          └──► request loop (rayon pool) ──► output tree
//! ```

mod content;
mod lifecycle;
mod path;
mod response;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::config::ProjectConfig;
use crate::core::{build_error, register_server, set_build_result};
use crate::{debug, log};
use content::HOTRELOAD_PATH;

/// Worker threads answering HTTP requests
const REQUEST_THREADS: usize = 4;

/// What the request handlers need, fixed for the server's lifetime.
struct ServeContext {
    output: PathBuf,
    /// Live reload port, `None` when watching is off
    ws_port: Option<u16>,
}

/// Build once, then serve the output tree until Ctrl+C.
pub fn serve_project(config: Arc<ProjectConfig>) -> Result<()> {
    let inputs = initial_build(&config);

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let ws = if config.serve.watch {
        match crate::reload::server::bind(config.serve.interface, config.serve.ws_port) {
            Ok(bound) => Some(bound),
            Err(e) => {
                log!("reload"; "live reload disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };
    let ws_port = ws.as_ref().map(|(_, port)| *port);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    if !config.serve.watch {
        debug!("serve"; "watching disabled");
    }

    let actors = config.serve.watch.then(|| {
        lifecycle::spawn_actors(
            Arc::clone(&config),
            inputs,
            ws.map(|(listener, _)| listener),
            shutdown_rx,
        )
    });

    let context = Arc::new(ServeContext {
        output: config.build.output.clone(),
        ws_port,
    });
    run_request_loop(&server, &context)?;

    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

/// A failed first build is reported, and the server starts anyway.
///
/// Returns the source files the build read, empty when it failed.
fn initial_build(config: &ProjectConfig) -> Vec<PathBuf> {
    match super::build::build_project(config, false) {
        Ok(plan) => {
            set_build_result(None);
            plan.inputs().iter().cloned().collect()
        }
        Err(e) => {
            let message = format!("{e:#}");
            log!("error"; "initial build failed: {}", message);
            set_build_result(Some(message));
            Vec::new()
        }
    }
}

fn run_request_loop(server: &Server, context: &Arc<ServeContext>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let context = Arc::clone(context);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &context) {
                debug!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, context: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().to_string();

    if let Some(port) = context.ws_port
        && url.split('?').next() == Some(HOTRELOAD_PATH)
    {
        return response::respond_hotreload_js(request, port);
    }

    let resolved = path::resolve_path(&url, &context.output);
    let is_page = match &resolved {
        Some(file) => crate::utils::mime::is_html(crate::utils::mime::from_path(file)),
        None => path::wants_html(&url),
    };

    if is_page && let Some(message) = build_error() {
        return response::respond_build_error(request, &message, context.ws_port);
    }

    match resolved {
        Some(file) => response::respond_file(request, &file, context.ws_port),
        None => response::respond_not_found(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use tempfile::TempDir;

    /// Serve one request for `url` and return the raw response.
    fn fetch(context: ServeContext, url: &str) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let handle = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            handle_request(request, &context).unwrap();
        });

        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(
            stream,
            "GET {url} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        handle.join().unwrap();
        response
    }

    fn context(dir: &TempDir, ws_port: Option<u16>) -> ServeContext {
        let output = dir.path().join("dist");
        std::fs::create_dir_all(output.join("js")).unwrap();
        std::fs::write(output.join("js/app.bundle.js"), "console.log(1);").unwrap();
        ServeContext { output, ws_port }
    }

    #[test]
    fn test_serves_output_file() {
        let dir = TempDir::new().unwrap();
        let response = fetch(context(&dir, Some(35729)), "/js/app.bundle.js");
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("text/javascript"));
        assert!(response.ends_with("console.log(1);"));
    }

    #[test]
    fn test_hotreload_route() {
        let dir = TempDir::new().unwrap();
        let response = fetch(context(&dir, Some(35800)), "/__sprig/hotreload.js");
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("const port = 35800;"));

        // Without live reload the route does not exist
        let response = fetch(context(&dir, None), "/__sprig/hotreload.js");
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn test_missing_asset_is_404() {
        let dir = TempDir::new().unwrap();
        let response = fetch(context(&dir, None), "/css/missing.css");
        assert!(response.starts_with("HTTP/1.1 404"));
    }
}
