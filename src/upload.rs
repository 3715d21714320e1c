use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ObjectId;

pub const IMAGE_DIR: &str = "images";
const PUBLIC_PREFIX: &str = "public/";

/// File extensions the upload accepts and the content type each must carry.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file was sent")]
    MissingFile,
    #[error("file is not in: {0:?}")]
    NotAllowed(Vec<&'static str>),
    #[error("file is too big: {0}")]
    TooBig(usize),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("storing file failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A file part as received, before any checks.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub content_type: String,
    pub bytes: Bytes,
}

/// The fields of the profile form.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub image: Option<ImageFile>,
}

impl ProfileForm {
    /// Read `name` and `image` out of a multipart body. Other parts are
    /// skipped. An image part with no content counts as no image.
    pub async fn read(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = ProfileForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("name") => form.name = Some(field.text().await?),
                Some("image") => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.image = Some(ImageFile { content_type, bytes });
                    }
                }
                other => debug!(field = ?other, "Ignoring form field"),
            }
        }

        Ok(form)
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    max_size: usize,
    allowed: Vec<&'static str>,
}

impl ImageUpload {
    pub fn new(max_size: usize, allowed: &[&'static str]) -> Self {
        ImageUpload {
            max_size,
            allowed: allowed.to_vec(),
        }
    }

    /// 1 MB, png or jpg.
    pub fn profile() -> Self {
        Self::new(1_000_000, &["png", "jpg"])
    }

    /// Check the declared content type and size, returning the extension
    /// the stored file gets.
    pub fn validate(&self, file: &ImageFile) -> Result<&'static str, UploadError> {
        let ext = self
            .allowed
            .iter()
            .copied()
            .find(|ext| content_type_of(ext) == Some(file.content_type.as_str()))
            .ok_or_else(|| UploadError::NotAllowed(self.allowed.clone()))?;

        if self.max_size > 0 && file.bytes.len() > self.max_size {
            return Err(UploadError::TooBig(self.max_size));
        }

        Ok(ext)
    }

    /// Validate `file` and write it below `public_dir`. Returns the public
    /// reference to store.
    pub async fn store(
        &self,
        public_dir: &Path,
        file: Option<&ImageFile>,
    ) -> Result<String, UploadError> {
        let file = file.ok_or(UploadError::MissingFile)?;
        let ext = self.validate(file)?;

        let dir = public_dir.join(IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("image-{}.{ext}", ObjectId::new());
        tokio::fs::write(dir.join(&name), &file.bytes).await?;

        Ok(format!("{PUBLIC_PREFIX}{IMAGE_DIR}/{name}"))
    }
}

fn content_type_of(ext: &str) -> Option<&'static str> {
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

/// Map a stored reference back to its file. References that point anywhere
/// but the image directory resolve to nothing.
pub fn stored_path(public_dir: &Path, reference: &str) -> Option<PathBuf> {
    let relative = reference.strip_prefix(PUBLIC_PREFIX)?;
    let name = relative.strip_prefix(IMAGE_DIR)?.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') || name.contains("..") {
        return None;
    }
    Some(public_dir.join(IMAGE_DIR).join(name))
}

/// Delete a previously stored image. Failure is logged and otherwise ignored.
pub async fn remove_stored(public_dir: &Path, reference: &str) {
    let Some(path) = stored_path(public_dir, reference) else {
        warn!(reference, "Not deleting image outside the image directory");
        return;
    };
    if let Err(err) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), %err, "Image was not deleted");
    }
}
