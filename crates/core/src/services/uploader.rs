//! Attachment uploads to blob storage.

use std::sync::Arc;

use chrono::Utc;
use coursedesk_common::{AppError, AppResult, StorageBackend};
use coursedesk_db::entities::content_item::{Attachment, MediaType};
use futures::future::join_all;

/// Key prefix for every uploaded attachment.
pub const UPLOAD_PREFIX: &str = "course_uploads/";

/// A file received from the client, not yet stored.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub bytes: Vec<u8>,
    pub display_name: String,
    pub content_type: String,
}

/// Uploads a batch of files concurrently.
#[derive(Clone)]
pub struct AttachmentUploader {
    storage: Arc<dyn StorageBackend>,
}

impl AttachmentUploader {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Upload every file and describe the results in input order.
    ///
    /// Fails with [`AppError::Upload`] if any upload fails. Blobs already
    /// stored by the same batch are left in place and logged.
    pub async fn upload_all(&self, files: &[LocalFile]) -> AppResult<Vec<Attachment>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let started = Utc::now().timestamp_millis();
        let keys: Vec<String> = files
            .iter()
            .enumerate()
            .map(|(i, file)| storage_key(started + i as i64, &file.display_name))
            .collect();

        let results = join_all(files.iter().zip(&keys).map(|(file, key)| {
            self.storage
                .upload(key, &file.bytes, &file.content_type)
        }))
        .await;

        let mut attachments = Vec::with_capacity(files.len());
        let mut stored_keys = Vec::new();
        let mut first_error = None;

        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(uploaded) => {
                    stored_keys.push(uploaded.key);
                    attachments.push(Attachment {
                        name: file.display_name.clone(),
                        url: uploaded.url,
                        media_type: MediaType::from_mime(&file.content_type),
                    });
                }
                Err(err) => {
                    tracing::error!(file = %file.display_name, error = %err, "Attachment upload failed");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            if !stored_keys.is_empty() {
                tracing::warn!(keys = ?stored_keys, "Batch aborted, uploaded blobs left orphaned");
            }
            return Err(match err {
                AppError::Upload(_) => err,
                other => AppError::Upload(other.to_string()),
            });
        }

        tracing::info!(count = attachments.len(), "Uploaded attachments");
        Ok(attachments)
    }
}

/// Storage key for an upload: `course_uploads/{millis}_{name}`.
#[must_use]
pub fn storage_key(unix_millis: i64, display_name: &str) -> String {
    format!("{UPLOAD_PREFIX}{unix_millis}_{}", sanitize_file_name(display_name))
}

/// Collapse whitespace runs to `_` and drop path separators.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c != '/' && c != '\\' {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use coursedesk_common::UploadedFile;
    use std::sync::Mutex;

    /// Records uploads; fails any key containing `fail_marker`.
    #[derive(Default)]
    pub(crate) struct RecordingStorage {
        pub(crate) stored: Mutex<Vec<String>>,
        pub(crate) fail_marker: Option<String>,
    }

    impl RecordingStorage {
        pub(crate) fn failing_on(marker: &str) -> Self {
            Self {
                stored: Mutex::default(),
                fail_marker: Some(marker.to_string()),
            }
        }

        pub(crate) fn keys(&self) -> Vec<String> {
            self.stored.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for RecordingStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            if let Some(marker) = &self.fail_marker {
                if key.contains(marker.as_str()) {
                    return Err(AppError::Upload(format!("connection reset for {key}")));
                }
            }
            self.stored.lock().unwrap().push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
            })
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://blobs.example/{key}")
        }
    }

    pub(crate) fn local(name: &str, content_type: &str) -> LocalFile {
        LocalFile {
            bytes: name.as_bytes().to_vec(),
            display_name: name.to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Lecture  1 notes.pdf"), "Lecture_1_notes.pdf");
        assert_eq!(sanitize_file_name("../etc/passwd"), "..etcpasswd");
        assert_eq!(sanitize_file_name("a\tb\\c"), "a_bc");
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            storage_key(1_700_000_000_000, "Week 1.mp4"),
            "course_uploads/1700000000000_Week_1.mp4"
        );
    }

    #[tokio::test]
    async fn test_upload_all_keeps_order_and_media_types() {
        let storage = Arc::new(RecordingStorage::default());
        let uploader = AttachmentUploader::new(storage.clone());

        let attachments = uploader
            .upload_all(&[
                local("lecture.mp4", "video/mp4"),
                local("sheet.pdf", "application/pdf"),
                local("lecture.mp4", "video/mp4"),
            ])
            .await
            .unwrap();

        assert_eq!(attachments.len(), 3);
        assert_eq!(attachments[0].media_type, MediaType::Video);
        assert_eq!(attachments[1].media_type, MediaType::File);
        assert_eq!(attachments[1].name, "sheet.pdf");
        assert!(attachments[0].url.starts_with("https://blobs.example/course_uploads/"));
        // Same name twice in one batch still gets two keys
        assert_ne!(attachments[0].url, attachments[2].url);
        assert_eq!(storage.keys().len(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch_and_leaves_others() {
        let storage = Arc::new(RecordingStorage::failing_on("broken"));
        let uploader = AttachmentUploader::new(storage.clone());

        let result = uploader
            .upload_all(&[
                local("good.pdf", "application/pdf"),
                local("broken.pdf", "application/pdf"),
            ])
            .await;

        assert!(matches!(result, Err(AppError::Upload(_))));
        let keys = storage.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with("_good.pdf"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_storage() {
        let storage = Arc::new(RecordingStorage::failing_on(""));
        let uploader = AttachmentUploader::new(storage);

        assert!(uploader.upload_all(&[]).await.unwrap().is_empty());
    }
}
