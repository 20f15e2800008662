//! NDJSON body for the single-file commit endpoint.
//!
//! Line 1 is the commit header, line 2 carries the file inline as base64.
//! Inline files are all this client sends; large-file (LFS) uploads are not
//! implemented.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

pub(super) const CONTENT_TYPE: &str = "application/x-ndjson";

pub(super) fn commit_summary(destination: &str) -> String {
    format!("Upload {} with storageface", destination)
}

pub(super) fn commit_body(destination: &str, content: &[u8]) -> Vec<u8> {
    let header = json!({
        "key": "header",
        "value": { "summary": commit_summary(destination), "description": "" },
    });
    let file = json!({
        "key": "file",
        "value": {
            "content": STANDARD.encode(content),
            "path": destination,
            "encoding": "base64",
        },
    });
    let mut out = Vec::with_capacity(content.len() * 4 / 3 + 256);
    for line in [header, file] {
        out.extend_from_slice(line.to_string().as_bytes());
        out.push(b'\n');
    }
    out
}
