//! Decoded Thrift call values.

use std::collections::BTreeMap;

use axum::body::Bytes;

use crate::dark_traffic::Mirror;

/// A decoded Thrift call: method name, transport headers and the encoded
/// argument struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThriftRequest {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Bytes,
}

impl ThriftRequest {
    pub fn new(method: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            method: method.into(),
            headers: BTreeMap::new(),
            payload: payload.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

impl Mirror for ThriftRequest {
    fn mirror(&self) -> Self {
        self.clone()
    }
}

/// Result of a Thrift call as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThriftResponse {
    /// Encoded result struct.
    Reply(Bytes),
    /// A declared or application exception, returned to the client in band.
    Exception { name: String, message: String },
}

impl ThriftResponse {
    pub fn reply(payload: impl Into<Bytes>) -> Self {
        ThriftResponse::Reply(payload.into())
    }

    pub fn exception(name: impl Into<String>, message: impl Into<String>) -> Self {
        ThriftResponse::Exception {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, ThriftResponse::Exception { .. })
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            ThriftResponse::Reply(payload) => Some(payload),
            ThriftResponse::Exception { .. } => None,
        }
    }
}
