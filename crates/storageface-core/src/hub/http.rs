//! One blocking HTTP exchange with the hub over libcurl.

use std::time::Duration;

use crate::error::UploadError;

const USER_AGENT: &str = concat!("storageface/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Method {
    Get,
    Post,
}

pub(super) struct Request<'a> {
    pub method: Method,
    pub url: &'a str,
    pub token: &'a str,
    /// Body and its content type (POST only).
    pub body: Option<(&'a [u8], &'a str)>,
}

#[derive(Debug)]
pub(super) struct Response {
    pub body: Vec<u8>,
}

impl Response {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, UploadError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| UploadError::InvalidResponse(format!("{}", e)))
    }
}

/// Performs the request. Non-2xx statuses become `UploadError::Http` carrying
/// the hub's error message. `progress`, when given, receives `(sent, total)`
/// request-body bytes as curl reports them.
pub(super) fn perform(
    req: &Request<'_>,
    connect_timeout: Duration,
    progress: Option<&mut dyn FnMut(u64, u64)>,
) -> Result<Response, UploadError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(req.url)?;
    easy.useragent(USER_AGENT)?;
    easy.follow_location(true)?;
    easy.connect_timeout(connect_timeout)?;
    // Abort if throughput drops below 1 KiB/s for 60s rather than using a wall-clock limit.
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;

    let mut list = curl::easy::List::new();
    // Anonymous requests (public repositories) carry no Authorization header.
    if !req.token.is_empty() {
        list.append(&format!("Authorization: Bearer {}", req.token))?;
    }
    list.append("Accept: application/json")?;
    // No 100-continue round trip for large bodies.
    list.append("Expect:")?;
    match (req.method, req.body) {
        (Method::Post, Some((body, content_type))) => {
            list.append(&format!("Content-Type: {}", content_type))?;
            easy.post(true)?;
            easy.post_fields_copy(body)?;
        }
        (Method::Post, None) => {
            easy.post(true)?;
            easy.post_field_size(0)?;
        }
        (Method::Get, _) => easy.get(true)?,
    }
    easy.http_headers(list)?;
    if progress.is_some() {
        easy.progress(true)?;
    }

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        if let Some(cb) = progress {
            transfer.progress_function(move |_dltotal, _dlnow, ultotal, ulnow| {
                cb(ulnow.max(0.0) as u64, ultotal.max(0.0) as u64);
                true
            })?;
        }
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    tracing::debug!(method = ?req.method, url = req.url, status, bytes = body.len(), "hub request");
    if !(200..300).contains(&status) {
        return Err(UploadError::Http {
            status,
            message: error_message(&body),
        });
    }
    Ok(Response { body })
}

/// Extracts `{"error": "..."}` from a hub error body, else a trimmed text prefix.
pub(super) fn error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct HubError {
        error: String,
    }
    if let Ok(e) = serde_json::from_slice::<HubError>(body) {
        return e.error;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    const MAX: usize = 200;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut cut = MAX;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}
