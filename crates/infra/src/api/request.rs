//! Rebuildable request descriptions
//!
//! A `reqwest::RequestBuilder` with a multipart body cannot be cloned, so the
//! transport keeps the request as data and builds a fresh `reqwest` request
//! for every dispatch.

use std::path::Path;

use rcm_domain::{RcmError, UploadFile};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::errors::InfraError;

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(UploadFile),
}

/// One named part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

impl FormField {
    /// Plain text part
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: FormValue::Text(value.into()) }
    }

    /// File part
    pub fn file(name: impl Into<String>, file: UploadFile) -> Self {
        Self { name: name.into(), value: FormValue::File(file) }
    }

    /// Read a file from disk into a form field
    ///
    /// The MIME type is inferred from the extension.
    ///
    /// # Errors
    ///
    /// Returns `RcmError::NotFound` or `RcmError::Storage` if the file cannot
    /// be read.
    pub async fn file_from_path(name: impl Into<String>, path: &Path) -> Result<Self, RcmError> {
        Ok(Self::file(name, read_upload(path).await?))
    }

    fn to_part(&self) -> Result<Part, RcmError> {
        match &self.value {
            FormValue::Text(text) => Ok(Part::text(text.clone())),
            FormValue::File(file) => Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|err| RcmError::from(InfraError::from(err))),
        }
    }
}

/// Load a file into memory for upload
///
/// # Errors
///
/// Returns `RcmError::NotFound` or `RcmError::Storage` if the file cannot be
/// read.
pub async fn read_upload(path: &Path) -> Result<UploadFile, RcmError> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        let mapped: RcmError = InfraError::from(err).into();
        match mapped {
            RcmError::NotFound(_) => RcmError::NotFound(format!("{} does not exist", path.display())),
            other => other,
        }
    })?;

    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

    Ok(UploadFile::new(file_name, bytes))
}

/// Request body, kept as data so it can be sent more than once
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

/// A backend call relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    /// Request with no query and no body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: RequestBody::Empty }
    }

    /// `GET` request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query parameters
    #[must_use]
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body
    ///
    /// # Errors
    ///
    /// Returns `RcmError::InvalidInput` if the body cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, RcmError> {
        let value = serde_json::to_value(body)
            .map_err(|err| RcmError::InvalidInput(format!("failed to serialize body: {err}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Use a multipart body
    #[must_use]
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    /// Build a fresh multipart form from the stored fields
    pub(crate) fn form(fields: &[FormField]) -> Result<Form, RcmError> {
        fields.iter().try_fold(Form::new(), |form, field| {
            Ok(form.part(field.name.clone(), field.to_part()?))
        })
    }
}

/// Whether a request has already been through the refresh-and-retry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    NotRetried,
    Retried,
}

/// A request on its way through the transport
///
/// The only transition is `NotRetried → Retried`, so a request can be retried
/// at most once after a token refresh.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    request: ApiRequest,
    retry: RetryState,
}

impl PendingRequest {
    /// Envelope for a request that has not been retried yet
    pub fn new(request: ApiRequest) -> Self {
        Self { request, retry: RetryState::NotRetried }
    }

    /// Request to dispatch
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Whether the request was already retried
    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    /// Claim the single retry; `false` if it was already used
    pub fn mark_retried(&mut self) -> bool {
        match self.retry {
            RetryState::NotRetried => {
                self.retry = RetryState::Retried;
                true
            }
            RetryState::Retried => false,
        }
    }
}
