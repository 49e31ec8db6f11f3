//! Handler return values and their translation into replies.
//!
//! A handler either returns a [`ResponseEntity`], which controls status,
//! headers and an optional JSON body, or any other value, which is sent as
//! text with status 200.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::codec;
use crate::error::HandlerError;

/// A structured response: status, optional body and headers.
///
/// # Example
///
/// ```
/// use heron_core::ResponseEntity;
/// use http::StatusCode;
///
/// let response = ResponseEntity::created(serde_json::json!({ "id": 1 }))
///     .header("X-Trace", "abc");
///
/// assert_eq!(response.status_code(), StatusCode::CREATED);
/// assert_eq!(response.headers(), [("X-Trace".to_string(), "abc".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEntity<T> {
    status: StatusCode,
    body: Option<T>,
    headers: Vec<(String, String)>,
}

impl<T> ResponseEntity<T> {
    /// 200 with a body.
    pub fn ok(body: T) -> Self {
        Self::status(StatusCode::OK, body)
    }

    /// 201 with a body.
    pub fn created(body: T) -> Self {
        Self::status(StatusCode::CREATED, body)
    }

    /// Any status with a body.
    pub fn status(status: StatusCode, body: T) -> Self {
        Self {
            status,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    /// Any status without a body.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: None,
            headers: Vec::new(),
        }
    }

    /// Adds a response header.
    ///
    /// Names and values are validated when the response is sent; an invalid
    /// header turns the response into a handler failure.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&T> {
        self.body.as_ref()
    }

    /// Returns the headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl ResponseEntity<()> {
    /// 204 without a body.
    #[must_use]
    pub fn no_content() -> Self {
        Self::empty(StatusCode::NO_CONTENT)
    }
}

/// What a handler produced, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A structured response with an already encoded body.
    Entity {
        /// Status code.
        status: StatusCode,
        /// Headers set by the handler.
        headers: HeaderMap,
        /// Encoded JSON body.
        body: Option<Bytes>,
    },
    /// The text form of a plain return value, sent with status 200.
    Text(String),
}

/// Conversion of a handler return value into a [`Reply`].
pub trait IntoReply {
    /// Performs the conversion, encoding any body.
    fn into_reply(self) -> Result<Reply, HandlerError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(self)
    }
}

impl<T: Serialize> IntoReply for ResponseEntity<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HandlerError::with_source(format!("invalid header name '{name}'"), e))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| HandlerError::with_source(format!("invalid value for header '{name}'"), e))?;
            headers.append(name, value);
        }

        let body = self.body.as_ref().map(codec::encode).transpose()?;

        Ok(Reply::Entity {
            status: self.status,
            headers,
            body,
        })
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Text(self))
    }
}

impl IntoReply for &str {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Text(self.to_string()))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Text(String::new()))
    }
}

macro_rules! text_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Result<Reply, HandlerError> {
                    Ok(Reply::Text(self.to_string()))
                }
            }
        )*
    };
}

text_reply!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: Into<HandlerError>,
{
    fn into_reply(self) -> Result<Reply, HandlerError> {
        self.map_err(Into::into)?.into_reply()
    }
}
