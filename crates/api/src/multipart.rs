//! Multipart form decoding for the resource create and update endpoints.

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use reshub_core::error::CoreError;
use reshub_core::messages;
use reshub_core::types::DbId;
use reshub_core::upload::{validate_content_type, validate_size};
use reshub_core::validation::parse_id_list_str;

use crate::error::{AppError, AppResult};
use crate::storage::UploadRequest;

/// Name of the form field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A decoded multipart body: text fields by name plus at most one file.
#[derive(Debug, Default)]
pub struct ResourceForm {
    fields: HashMap<String, Vec<String>>,
    pub file: Option<UploadRequest>,
}

impl ResourceForm {
    /// Read every part of `multipart`.
    ///
    /// The file part is checked against the MIME allow-list before its body
    /// is read and against `max_file_bytes` after. Repeated fields and
    /// `name[]` fields accumulate.
    pub async fn parse(multipart: &mut Multipart, max_file_bytes: usize) -> AppResult<Self> {
        let mut form = Self::default();

        let form_error = |err| multipart_error(err, max_file_bytes);

        while let Some(field) = multipart.next_field().await.map_err(form_error)? {
            let name = field.name().unwrap_or("").to_string();

            if name == FILE_FIELD {
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                validate_content_type(&content_type)?;
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(form_error)?;
                validate_size(bytes.len(), max_file_bytes)?;
                form.file = Some(UploadRequest {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
                continue;
            }

            let key = name.strip_suffix("[]").unwrap_or(&name).to_string();
            let text = field.text().await.map_err(form_error)?;
            form.fields.entry(key).or_default().push(text);
        }

        Ok(form)
    }

    /// Last value sent for `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Owned copy of [`text`](Self::text).
    pub fn string(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// Whether the client sent `name` at all.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Leniently parsed id list from every value sent for `name`. Each value
    /// may be a single id or a JSON-encoded array.
    pub fn id_list(&self, name: &str) -> Vec<DbId> {
        let mut ids: Vec<DbId> = Vec::new();
        for value in self.fields.get(name).into_iter().flatten() {
            for id in parse_id_list_str(value) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

fn multipart_error(err: MultipartError, max_file_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Core(CoreError::PayloadTooLarge(messages::file_too_large(
            max_file_bytes,
        )));
    }
    AppError::BadRequest(err.body_text())
}
