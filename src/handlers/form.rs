//! Buffered `multipart/form-data` reader shared by the upload handlers.

use crate::{errors::AppError, models::song::UploadedFile};
use axum::extract::Multipart;
use std::collections::HashMap;

/// Text fields and file parts of one multipart request.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Drain `multipart`. A part with a file name is a file; anything else is
    /// a text field. Repeated text fields accumulate in order.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::bad_request(format!("failed to read part `{}`: {}", name, e))
                    })?;
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::bad_request(format!("failed to read field `{}`: {}", name, e))
                    })?;
                    form.fields.entry(name).or_default().push(value);
                }
            }
        }
        Ok(form)
    }

    /// First value of a text field, trimmed; `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::bad_request(format!("missing field `{}`", name)))
    }

    /// Every value of a repeated field. Comma separated values are split so
    /// `songs=a,b` and `songs=a&songs=b` read the same.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Take a non-empty file part out of the form.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|file| !file.bytes.is_empty())
    }
}
