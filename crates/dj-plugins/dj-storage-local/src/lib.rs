//! # dj-storage-local
//!
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and thumbnailing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use dj_core::traits::MediaStore;
use dj_core::MediaRejected;
use image::{DynamicImage, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

const THUMBNAIL_EDGE: u32 = 400;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
    max_upload_bytes: usize,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: impl Into<String>, max_upload_bytes: usize) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            root_path: root,
            url_prefix,
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// "ab/cd/abcd…"
    fn relative_path(media_id: &str) -> String {
        format!("{}/{}/{}", &media_id[0..2], &media_id[2..4], media_id)
    }

    fn thumbnail_relative_path(media_id: &str) -> String {
        format!("{}/{}/thumb_{}.webp", &media_id[0..2], &media_id[2..4], media_id)
    }

    fn check_acceptable(&self, data: &[u8], content_type: &str) -> Result<ImageFormat, MediaRejected> {
        if data.is_empty() {
            return Err(MediaRejected("empty upload".into()));
        }
        if data.len() > self.max_upload_bytes {
            return Err(MediaRejected(format!(
                "image is larger than {} bytes",
                self.max_upload_bytes
            )));
        }
        let declared: mime::Mime = content_type
            .parse()
            .map_err(|_| MediaRejected(format!("unknown content type {content_type}")))?;
        if declared.type_() != mime::IMAGE {
            return Err(MediaRejected(format!("{content_type} is not an image")));
        }
        image::guess_format(data).map_err(|_| MediaRejected("unrecognized image format".into()))
    }
}

fn is_media_id(media_id: &str) -> bool {
    media_id.len() == 64 && media_id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Bytes, content_type: &str) -> anyhow::Result<String> {
        let format = self.check_acceptable(&data, content_type)?;

        let hash = hex::encode(Sha256::digest(&data));
        let target_path = self.root_path.join(Self::relative_path(&hash));
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let thumb_path = self.root_path.join(Self::thumbnail_relative_path(&hash));
        let have_original = fs::try_exists(&target_path).await?;
        if have_original && fs::try_exists(&thumb_path).await? {
            debug!(media_id = %hash, "upload already stored");
            return Ok(hash);
        }

        // Thumbnail first: an original on disk implies its thumbnail is too.
        let img = decode(data.clone(), format)?;
        self.write_thumbnail(img, &thumb_path).await?;
        if !have_original {
            fs::write(&target_path, &data)
                .await
                .with_context(|| format!("writing {}", target_path.display()))?;
        }
        debug!(media_id = %hash, bytes = data.len(), "upload stored");
        Ok(hash)
    }

    fn url(&self, media_id: &str) -> String {
        if !is_media_id(media_id) {
            return String::new();
        }
        format!("{}/{}", self.url_prefix, Self::relative_path(media_id))
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        if !is_media_id(media_id) {
            return String::new();
        }
        format!("{}/{}", self.url_prefix, Self::thumbnail_relative_path(media_id))
    }
}

fn decode(data: Bytes, format: ImageFormat) -> anyhow::Result<DynamicImage> {
    ImageReader::with_format(Cursor::new(data), format)
        .decode()
        .map_err(|e| MediaRejected(format!("image could not be decoded: {e}")).into())
}

impl LocalMediaStore {
    async fn write_thumbnail(&self, img: DynamicImage, thumb_path: &Path) -> anyhow::Result<()> {
        let encoded = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
            // The WebP encoder only takes 8-bit RGB(A).
            let thumb = DynamicImage::ImageRgba8(img.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE).to_rgba8());
            let mut out = Cursor::new(Vec::new());
            thumb.write_to(&mut out, ImageFormat::WebP)?;
            Ok(out.into_inner())
        })
        .await??;
        fs::write(thumb_path, encoded)
            .await
            .with_context(|| format!("writing {}", thumb_path.display()))?;
        Ok(())
    }
}
