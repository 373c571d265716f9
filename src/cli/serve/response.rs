//! HTTP response handlers.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::content::maybe_inject_hotreload;
use crate::utils::mime::{self, types};

/// Byte range requested through a `Range` header.
#[derive(Debug, PartialEq, Eq)]
enum ByteRange {
    /// No usable range, send the whole file
    Full,
    /// Inclusive start and end offsets
    Partial(u64, u64),
    Unsatisfiable,
}

/// Respond with a file from the output tree.
pub fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    // Injected pages change length, so ranges only apply to other files
    if !mime::is_html(content_type)
        && let Some(value) = header_value(&request, "Range")
    {
        let size = fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        match parse_range(&value, size) {
            ByteRange::Partial(start, end) => {
                return respond_range(request, path, content_type, (start, end), size);
            }
            ByteRange::Unsatisfiable => {
                let response = Response::empty(StatusCode(416))
                    .with_header(header("Content-Range", &format!("bytes */{size}"))?);
                return request.respond(response).map_err(Into::into);
            }
            ByteRange::Full => {}
        }
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_hotreload(body, content_type, ws_port);
    send_body(request, 200, content_type, body)
}

/// Stream `start..=end` of the file as 206 Partial Content.
fn respond_range(
    request: Request,
    path: &Path,
    content_type: &'static str,
    (start, end): (u64, u64),
    size: u64,
) -> Result<()> {
    let length = end - start + 1;

    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let reader = file.take(length);

    let response = Response::new(
        StatusCode(206),
        vec![
            header("Content-Type", content_type)?,
            header("Content-Range", &format!("bytes {start}-{end}/{size}"))?,
            header("Accept-Ranges", "bytes")?,
        ],
        reader,
        usize::try_from(length).ok(),
        None,
    );

    request.respond(response)?;
    Ok(())
}

/// Parse a single `bytes=` range against a file of `size` bytes.
fn parse_range(value: &str, size: u64) -> ByteRange {
    let Some(spec) = value.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    // Multipart ranges are not worth supporting here
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((start, end)) = spec.trim().split_once('-') else {
        return ByteRange::Full;
    };

    match (start.trim(), end.trim()) {
        ("", suffix) => match suffix.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if size == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial(size.saturating_sub(n), size - 1),
            Err(_) => ByteRange::Full,
        },
        (start, end) => {
            let Ok(start) = start.parse::<u64>() else {
                return ByteRange::Full;
            };
            if start >= size {
                return ByteRange::Unsatisfiable;
            }
            if end.is_empty() {
                return ByteRange::Partial(start, size - 1);
            }
            match end.parse::<u64>() {
                Ok(end) if end >= start => ByteRange::Partial(start, end.min(size - 1)),
                _ => ByteRange::Full,
            }
        }
    }
}

/// Respond with 404, a plain-text body.
pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(
        request,
        503,
        types::PLAIN,
        b"503 Service Unavailable".to_vec(),
    )
}

/// Respond with the build error page; it reloads once a build succeeds.
pub fn respond_build_error(request: Request, message: &str, ws_port: Option<u16>) -> Result<()> {
    use crate::embed::serve::{ERROR_HTML, ErrorVars};

    if is_head_request(&request) {
        return send_head(request, 500, types::HTML);
    }

    let body = ERROR_HTML.render(&ErrorVars {
        message: message.to_string(),
    });
    let body = maybe_inject_hotreload(body.into_bytes(), types::HTML, ws_port);
    send_body(request, 500, types::HTML, body)
}

/// Respond with hotreload.js from memory.
pub fn respond_hotreload_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars};

    let body = HOTRELOAD_JS.render(&HotreloadVars { ws_port });
    send_body(request, 200, types::JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header {key}: {value}"))
}
