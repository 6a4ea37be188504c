//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network itself; a `Transport` executes the round-trip. Every
//! request carries its own timeout because each management endpoint has a
//! fixed deadline and there is no shared default.

use std::fmt;
use std::time::Duration;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `OutlineClient::build_*` methods. `path` is the full URL: the
/// client's base URL with the endpoint path appended.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Result of an exact-status check on a response.
///
/// The management API signals success of `PUT` and `DELETE` calls only
/// through the status code, so `success` is true only when the status equals
/// the one the endpoint promises (200 or 204). Any other code below 400 is a
/// non-error failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    pub status: u16,
    pub success: bool,
}

impl StatusOutcome {
    pub fn expecting(response: &HttpResponse, expected: u16) -> Self {
        Self {
            status: response.status,
            success: response.status == expected,
        }
    }
}
