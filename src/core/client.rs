//! Async client for the DeepL document translation endpoints

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{DocumentHandle, DocumentStatus, FileTask, JobState};

/// Outcome of a successful upload, poll and download sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedDocument {
    pub handle: DocumentHandle,
    pub bytes_written: u64,
    pub billed_characters: Option<u64>,
}

/// Submits documents, waits for them and fetches the results
#[derive(Debug, Clone)]
pub struct DocumentTranslator {
    client: reqwest::Client,
    config: Arc<TranslatorConfig>,
}

impl DocumentTranslator {
    /// Create a new translator; the config is validated first
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()?;

        info!(
            "Using DeepL endpoint {} ({} tier)",
            config.base_url(),
            if config.is_free_tier() { "free" } else { "standard" }
        );

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.config.api_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// Run the full upload, poll and download sequence for one file
    pub async fn translate_document(&self, task: &FileTask) -> Result<TranslatedDocument> {
        let handle = self.upload(&task.input, &task.target_lang).await?;
        let status = self.wait_for_completion(&handle).await?;
        let bytes_written = self.download(&handle, &task.output).await?;

        Ok(TranslatedDocument {
            handle,
            bytes_written,
            billed_characters: status.billed_characters,
        })
    }

    /// Submit a document for translation
    pub async fn upload(&self, path: &Path, target_lang: &str) -> Result<DocumentHandle> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TranslationError::FileError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        debug!("Uploading {} ({} bytes)", path.display(), bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type(path))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("target_lang", target_lang.to_string());

        if let Some(source_lang) = &self.config.source_lang {
            form = form.text("source_lang", source_lang.clone());
        }

        let response = self
            .client
            .post(self.url("/document"))
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::UploadError {
                status: status.as_u16(),
                message,
            });
        }

        let handle: DocumentHandle =
            response
                .json()
                .await
                .map_err(|e| TranslationError::InvalidResponseError {
                    message: e.to_string(),
                })?;

        debug!("Submitted {} as document {}", path.display(), handle.document_id);
        Ok(handle)
    }

    /// Query the current state of a submitted document
    pub async fn check_status(&self, handle: &DocumentHandle) -> Result<DocumentStatus> {
        let response = self
            .client
            .get(self.url(&format!("/document/{}", handle.document_id)))
            .header("Authorization", self.auth_header())
            .query(&[("document_key", handle.document_key.as_str())])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::StatusError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TranslationError::InvalidResponseError {
                message: e.to_string(),
            })
    }

    /// Poll until the document is done, failed, or the wait limit is hit
    pub async fn wait_for_completion(&self, handle: &DocumentHandle) -> Result<DocumentStatus> {
        let started = Instant::now();
        let max_wait = self.config.max_wait();
        let mut interval = self.config.poll_interval();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let status = self.check_status(handle).await?;

            match status.status {
                JobState::Done => {
                    debug!(
                        "Document {} done after {} status checks",
                        handle.document_id, attempts
                    );
                    return Ok(status);
                }
                JobState::Error => {
                    return Err(TranslationError::TranslationFailed {
                        document_id: handle.document_id.clone(),
                        message: status
                            .message
                            .unwrap_or_else(|| "no message provided".to_string()),
                    });
                }
                ref state => {
                    debug!(
                        "Document {} is {} (seconds_remaining={:?}), next check in {:?}",
                        handle.document_id, state, status.seconds_remaining, interval
                    );
                }
            }

            if let Some(max_wait) = max_wait {
                if started.elapsed() + interval > max_wait {
                    return Err(TranslationError::PollTimeout {
                        document_id: handle.document_id.clone(),
                        waited_secs: started.elapsed().as_secs(),
                        attempts,
                    });
                }
            }

            sleep(interval).await;
            interval = self.config.next_poll_interval(interval);
        }
    }

    /// Download the translated document and write it to `output`
    pub async fn download(&self, handle: &DocumentHandle, output: &Path) -> Result<u64> {
        let response = self
            .client
            .get(self.url(&format!("/document/{}/result", handle.document_id)))
            .header("Authorization", self.auth_header())
            .query(&[("document_key", handle.document_key.as_str())])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::DownloadError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(network_error)?;
        tokio::fs::write(output, &body)
            .await
            .map_err(|e| TranslationError::FileError {
                path: output.display().to_string(),
                message: e.to_string(),
            })?;

        debug!("Wrote {} bytes to {}", body.len(), output.display());
        Ok(body.len() as u64)
    }
}

fn network_error(err: reqwest::Error) -> TranslationError {
    TranslationError::NetworkError {
        message: err.to_string(),
    }
}

/// MIME type for the upload part, from the file extension
fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
