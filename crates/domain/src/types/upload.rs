//! In-memory file payloads for multipart uploads

use std::fmt;

use crate::constants::{CLAIMS_FILE_FIELD, MEDICAL_RULES_FIELD, TECHNICAL_RULES_FIELD};

/// A file held in memory so a request can be rebuilt after a token refresh
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create a payload, inferring the MIME type from the file extension
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self { file_name, content_type, bytes }
    }

    /// Size of the contents in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no contents
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// MIME type for the spreadsheet and rule document formats the backend accepts
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("csv") => "text/csv",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Files submitted to `POST /jobs/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpload {
    pub claims_file: UploadFile,
    pub technical_rules: Option<UploadFile>,
    pub medical_rules: Option<UploadFile>,
}

impl JobUpload {
    /// Upload with only the claims file
    pub fn new(claims_file: UploadFile) -> Self {
        Self { claims_file, technical_rules: None, medical_rules: None }
    }

    /// Attach the technical rules PDF
    #[must_use]
    pub fn with_technical_rules(mut self, file: UploadFile) -> Self {
        self.technical_rules = Some(file);
        self
    }

    /// Attach the medical rules PDF
    #[must_use]
    pub fn with_medical_rules(mut self, file: UploadFile) -> Self {
        self.medical_rules = Some(file);
        self
    }

    /// Form field name paired with each present file
    pub fn parts(&self) -> Vec<(&'static str, &UploadFile)> {
        let mut parts = vec![(CLAIMS_FILE_FIELD, &self.claims_file)];
        if let Some(file) = &self.technical_rules {
            parts.push((TECHNICAL_RULES_FIELD, file));
        }
        if let Some(file) = &self.medical_rules {
            parts.push((MEDICAL_RULES_FIELD, file));
        }
        parts
    }
}
