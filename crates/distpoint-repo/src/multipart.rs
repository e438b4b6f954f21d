//! multipart/form-data bodies with payload-safe boundaries
//!
//! A boundary that happens to occur inside an uploaded file splits that
//! file in two on the server. Boundaries here are drawn at random and
//! checked against every part before the body is assembled.

use rand::Rng;

/// Draws before giving up on finding a boundary absent from the payload
pub const MAX_BOUNDARY_ATTEMPTS: usize = 16;

/// RFC 2046 caps boundaries at 70 characters
const MAX_BOUNDARY_LEN: usize = 70;

/// One form field
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl Part {
    /// Plain text field
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    /// File field sent as opaque bytes
    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some("application/octet-stream".to_string()),
            data,
        }
    }

    fn headers(&self) -> String {
        let mut headers = format!("Content-Disposition: form-data; name=\"{}\"", quote(&self.name));
        if let Some(file_name) = &self.file_name {
            headers.push_str(&format!("; filename=\"{}\"", quote(file_name)));
        }
        headers.push_str("\r\n");
        if let Some(content_type) = &self.content_type {
            headers.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        headers
    }
}

/// A form waiting for a boundary
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

/// No boundary distinct from the payload was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryCollision {
    pub attempts: usize,
}

/// Encoded body plus the boundary it was built with
#[derive(Debug, Clone)]
pub struct EncodedForm {
    boundary: String,
    body: Vec<u8>,
}

impl EncodedForm {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Encode with random boundaries
    pub fn encode(self) -> Result<EncodedForm, BoundaryCollision> {
        self.encode_with(random_boundary)
    }

    /// Encode, taking boundary candidates from `next` until one is safe
    pub fn encode_with<F>(self, mut next: F) -> Result<EncodedForm, BoundaryCollision>
    where
        F: FnMut() -> String,
    {
        for _ in 0..MAX_BOUNDARY_ATTEMPTS {
            let boundary = next();
            if self.is_safe_boundary(&boundary) {
                return Ok(self.assemble(boundary));
            }
            tracing::debug!("multipart boundary candidate occurs in payload, drawing another");
        }

        Err(BoundaryCollision {
            attempts: MAX_BOUNDARY_ATTEMPTS,
        })
    }

    /// A boundary is safe when it is well-formed and absent from every
    /// part's headers and content
    pub fn is_safe_boundary(&self, boundary: &str) -> bool {
        if boundary.is_empty()
            || boundary.len() > MAX_BOUNDARY_LEN
            || !boundary.bytes().all(is_boundary_char)
        {
            return false;
        }

        let needle = boundary.as_bytes();
        !self.parts.iter().any(|part| {
            contains(&part.data, needle) || contains(part.headers().as_bytes(), needle)
        })
    }

    fn assemble(self, boundary: String) -> EncodedForm {
        let size: usize = self.parts.iter().map(|p| p.data.len() + 256).sum();
        let mut body = Vec::with_capacity(size);

        for part in &self.parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(boundary.as_bytes());
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(part.headers().as_bytes());
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");

        EncodedForm { boundary, body }
    }
}

fn random_boundary() -> String {
    let token: u128 = rand::rng().random();
    format!("distpoint-{:032x}", token)
}

fn is_boundary_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'\'' | b'+')
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Header-safe field values: quotes escaped, line breaks dropped
fn quote(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { "%22".to_string() } else { c.to_string() })
        .collect()
}

/// Split an encoded body back into (headers, content) pairs
#[cfg(test)]
pub(crate) fn split_parts(body: &[u8], boundary: &str) -> Vec<(String, Vec<u8>)> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();
    let mut positions = Vec::new();
    let mut i = 0;
    while i + delimiter.len() <= body.len() {
        if body[i..].starts_with(&delimiter) {
            positions.push(i);
            i += delimiter.len();
        } else {
            i += 1;
        }
    }

    for window in positions.windows(2) {
        let start = window[0] + delimiter.len() + 2;
        // Strip the CRLF that precedes the next delimiter
        let end = window[1] - 2;
        let section = &body[start..end];
        let split = section
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .unwrap_or(section.len());
        let headers = String::from_utf8_lossy(&section[..split]).to_string();
        let content = section[split + 4..].to_vec();
        parts.push((headers, content));
    }
    parts
}
