//! The uniform `{ data, error, count }` response shape.
//!
//! Every terminal operation on a query returns an `Envelope`. `error` is
//! set if and only if the operation failed, and `data` is `None` whenever
//! `error` is set.

use serde::{Deserialize, Serialize};

use crate::error::{ClinicError, ClinicResult};

/// The serialized form of a failure: a single human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl From<&ClinicError> for ErrorBody {
    fn from(err: &ClinicError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Result envelope returned by every terminal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> Envelope<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            count: None,
        }
    }

    /// A successful envelope with no payload (e.g. after a delete).
    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
            count: None,
        }
    }

    /// A failed envelope. `data` is always `None`.
    pub fn err(error: &ClinicError) -> Self {
        Self {
            data: None,
            error: Some(ErrorBody::from(error)),
            count: None,
        }
    }

    pub fn with_count(mut self, count: Option<usize>) -> Self {
        self.count = count;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The error message, if the operation failed.
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Convert into a `Result`, dropping the count.
    ///
    /// Succeeds with `None` for successful operations that carry no data.
    pub fn into_result(self) -> Result<Option<T>, ErrorBody> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

impl<T> From<ClinicResult<T>> for Envelope<T> {
    fn from(result: ClinicResult<T>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(err) => Envelope::err(&err),
        }
    }
}
