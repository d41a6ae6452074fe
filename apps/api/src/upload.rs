//! Multipart upload parsing shared by the document endpoints.

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content: Bytes,
}

/// A fully-read multipart body: file parts and text parts keyed by field name,
/// in the order they arrived.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<(String, UploadedFile)>,
    texts: Vec<(String, String)>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .file_name()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string);
            let is_file = field.file_name().is_some();

            if is_file {
                let content = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Could not read file field '{name}': {e}"))
                })?;
                // Browsers send an empty, unnamed part when no file was chosen.
                if filename.is_none() && content.is_empty() {
                    continue;
                }
                debug!("Received file field '{name}' ({} bytes)", content.len());
                form.files.push((name, UploadedFile { filename, content }));
            } else {
                let value = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Could not read text field '{name}': {e}"))
                })?;
                form.texts.push((name, value));
            }
        }

        Ok(form)
    }

    /// Removes and returns the first file uploaded under any of `names`.
    pub fn take_file(&mut self, names: &[&str]) -> Option<UploadedFile> {
        let index = self
            .files
            .iter()
            .position(|(n, _)| names.contains(&n.as_str()))?;
        Some(self.files.remove(index).1)
    }

    /// Removes and returns every file uploaded under any of `names`, in upload order.
    pub fn take_files(&mut self, names: &[&str]) -> Vec<UploadedFile> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(n, _)| names.contains(&n.as_str()));
        self.files = kept;
        taken.into_iter().map(|(_, f)| f).collect()
    }

    /// Every text value submitted under any of `names`.
    pub fn texts(&self, names: &[&str]) -> Vec<&str> {
        self.texts
            .iter()
            .filter(|(n, _)| names.contains(&n.as_str()))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}
