//! Blocking HTTP/1.1 reader/writer for the form server.
//!
//! One request per connection. Bodies are only read for POST and must be
//! framed by Content-Length; chunked uploads are refused. The head is capped
//! at 32 KiB and the body at 1 MiB, the latter checked against the declared
//! length before anything is read.

use std::io::{Read, Write};

use thiserror::Error;

/// Largest request head (request line plus headers) we accept
const MAX_HEAD_SIZE: usize = 32 * 1024;

/// Largest request body we accept
pub const MAX_BODY_SIZE: usize = 1_048_576;

const MAX_HEADERS: usize = 64;

/// Why a request could not be read
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request headers exceed {MAX_HEAD_SIZE} bytes")]
    HeadersTooLarge,

    #[error("request body of {0} bytes exceeds {MAX_BODY_SIZE} bytes")]
    BodyTooLarge(usize),

    #[error("chunked transfer encoding is not supported")]
    Chunked,

    #[error("POST requires Content-Length")]
    MissingLength,

    #[error("malformed request: {0}")]
    Malformed(String),
}

impl RequestError {
    /// Status code to answer with
    pub fn status(&self) -> u16 {
        match self {
            Self::HeadersTooLarge => 431,
            Self::BodyTooLarge(_) => 413,
            Self::MissingLength => 411,
            Self::Chunked | Self::Malformed(_) => 400,
        }
    }
}

/// A request as the form routes see it
#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        411 => "Length Required",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        _ => "Internal Server Error",
    }
}

/// Read one request.
///
/// `Ok(None)` means the peer closed (or failed) before sending anything.
pub fn read_request(stream: &mut impl Read) -> Result<Option<HttpRequest>, RequestError> {
    let Some(head) = read_head(stream)? else {
        return Ok(None);
    };

    let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut slots);
    match parsed.parse(&head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(RequestError::Malformed("incomplete request head".into()))
        }
        Err(e) => return Err(RequestError::Malformed(e.to_string())),
    }

    let method = parsed.method.unwrap_or_default().to_string();
    let target = parsed.path.unwrap_or("/");
    let path = target.split_once('?').map_or(target, |(p, _)| p).to_string();
    let headers: Vec<(String, String)> = parsed
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();

    let mut request = HttpRequest {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    if request
        .header("Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        return Err(RequestError::Chunked);
    }

    if request.method == "POST" {
        let length = content_length(&request)?;
        request.body = read_body(stream, length)?;
    }

    Ok(Some(request))
}

/// Collect bytes up to and including the blank line ending the head
fn read_head(stream: &mut impl Read) -> Result<Option<Vec<u8>>, RequestError> {
    let mut head = Vec::with_capacity(1024);
    let mut byte = [0u8; 1];

    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(1) => head.push(byte[0]),
            Ok(_) | Err(_) if head.is_empty() => return Ok(None),
            Ok(_) => return Err(RequestError::Malformed("connection closed mid-head".into())),
            Err(e) => return Err(RequestError::Malformed(e.to_string())),
        }
        if head.len() > MAX_HEAD_SIZE {
            return Err(RequestError::HeadersTooLarge);
        }
    }

    Ok(Some(head))
}

fn content_length(request: &HttpRequest) -> Result<usize, RequestError> {
    let raw = request
        .header("Content-Length")
        .ok_or(RequestError::MissingLength)?;
    let length: usize = raw
        .trim()
        .parse()
        .map_err(|_| RequestError::Malformed(format!("bad Content-Length: {raw}")))?;
    if length > MAX_BODY_SIZE {
        return Err(RequestError::BodyTooLarge(length));
    }
    Ok(length)
}

fn read_body(stream: &mut impl Read, length: usize) -> Result<Vec<u8>, RequestError> {
    let mut body = vec![0u8; length];
    stream
        .read_exact(&mut body)
        .map_err(|e| RequestError::Malformed(format!("body shorter than Content-Length: {e}")))?;
    Ok(body)
}

/// Write a response and flush. Write errors mean the client left; they are dropped.
pub fn write_response(stream: &mut impl Write, response: &HttpResponse) {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let _ = stream
        .write_all(head.as_bytes())
        .and_then(|()| stream.write_all(&response.body))
        .and_then(|()| stream.flush());
}
