use crate::config::ImageConfig;
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Maximo de {max} imagens por anuncio")]
    TooMany { max: usize },

    #[error("Imagem {index} invalida")]
    Invalid { index: usize },

    #[error("Image processing failed: {0}")]
    Processing(String),
}

/// Decodes, resizes and stores listing photos under
/// `<root>/<usuario_id>/<anuncio_id>/imagem<n>.jpg`.
pub struct ImageService {
    config: ImageConfig,
}

/// Decodes an image, scales it to `width` keeping the aspect ratio and
/// re-encodes it as an RGB JPEG.
pub fn resize_to_jpeg(bytes: &[u8], width: u32, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;

    let (w, h) = (u64::from(img.width().max(1)), u64::from(img.height()));
    let height = u32::try_from(h * u64::from(width) / w)
        .unwrap_or(u32::MAX)
        .max(1);

    let rgb = img
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgb8();

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(buf)
}

impl ImageService {
    #[must_use]
    pub const fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        Path::new(&self.config.root)
    }

    #[must_use]
    pub fn listing_dir(&self, usuario_id: i32, anuncio_id: i32) -> PathBuf {
        self.root()
            .join(usuario_id.to_string())
            .join(anuncio_id.to_string())
    }

    /// Path stored in `imagem.img_filename`, relative to the image root.
    #[must_use]
    pub fn relative_path(usuario_id: i32, anuncio_id: i32, index: usize) -> String {
        format!("{usuario_id}/{anuncio_id}/imagem{index}.jpg")
    }

    /// Resizes every upload on the blocking pool. Nothing touches the disk here,
    /// so a bad upload rejects the whole batch before any row exists.
    pub async fn process_uploads(&self, uploads: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ImageError> {
        let max = self.config.max_per_listing;
        if uploads.len() > max {
            return Err(ImageError::TooMany { max });
        }

        let width = self.config.target_width;
        let quality = self.config.jpeg_quality;

        tokio::task::spawn_blocking(move || {
            uploads
                .iter()
                .enumerate()
                .map(|(index, bytes)| {
                    resize_to_jpeg(bytes, width, quality).map_err(|e| {
                        debug!(index, error = %e, "Rejected upload");
                        ImageError::Invalid { index }
                    })
                })
                .collect()
        })
        .await
        .map_err(|e| ImageError::Processing(e.to_string()))?
    }

    /// Writes processed JPEGs for a listing, returning their relative paths.
    pub async fn write_listing_images(
        &self,
        usuario_id: i32,
        anuncio_id: i32,
        images: &[Vec<u8>],
    ) -> Result<Vec<String>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self.listing_dir(usuario_id, anuncio_id);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut paths = Vec::with_capacity(images.len());
        for (index, jpeg) in images.iter().enumerate() {
            let relative = Self::relative_path(usuario_id, anuncio_id, index);
            let file_path = self.root().join(&relative);

            fs::write(&file_path, jpeg)
                .await
                .with_context(|| format!("Failed to write image to {}", file_path.display()))?;
            paths.push(relative);
        }

        info!(
            usuario_id,
            anuncio_id,
            count = paths.len(),
            "Stored listing images"
        );
        Ok(paths)
    }

    pub async fn remove_file(&self, relative: &str) -> Result<()> {
        let path = self.root().join(relative);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Image file already missing");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    /// Removes a listing directory and whatever is left in it.
    pub async fn remove_listing_dir(&self, usuario_id: i32, anuncio_id: i32) -> Result<()> {
        remove_dir_if_exists(&self.listing_dir(usuario_id, anuncio_id)).await
    }

    pub async fn remove_user_dir(&self, usuario_id: i32) -> Result<()> {
        remove_dir_if_exists(&self.root().join(usuario_id.to_string())).await
    }
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dir.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn service(root: &Path) -> ImageService {
        ImageService::new(ImageConfig {
            root: root.to_string_lossy().into_owned(),
            target_width: 100,
            jpeg_quality: 80,
            max_per_listing: 2,
        })
    }

    #[test]
    fn resize_keeps_aspect_ratio() {
        let jpeg = resize_to_jpeg(&png(400, 300), 100, 90).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 75));
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn resize_never_produces_zero_height() {
        let jpeg = resize_to_jpeg(&png(1000, 1), 10, 90).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.height(), 1);
    }

    #[test]
    fn resize_rejects_garbage() {
        assert!(resize_to_jpeg(b"not an image", 100, 90).is_err());
    }

    #[tokio::test]
    async fn uploads_are_validated_before_writing() {
        let root = std::env::temp_dir().join(format!("clozer-img-{}", uuid::Uuid::new_v4()));
        let service = service(&root);

        let err = service
            .process_uploads(vec![png(10, 10), b"junk".to_vec()])
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Invalid { index: 1 }));

        let err = service
            .process_uploads(vec![png(10, 10), png(10, 10), png(10, 10)])
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::TooMany { max: 2 }));

        assert!(!root.exists());
    }

    #[tokio::test]
    async fn write_and_remove_listing_images() {
        let root = std::env::temp_dir().join(format!("clozer-img-{}", uuid::Uuid::new_v4()));
        let service = service(&root);

        let processed = service.process_uploads(vec![png(20, 10)]).await.unwrap();
        let paths = service.write_listing_images(5, 12, &processed).await.unwrap();

        assert_eq!(paths, vec!["5/12/imagem0.jpg".to_string()]);
        assert!(root.join("5/12/imagem0.jpg").exists());

        service.remove_listing_dir(5, 12).await.unwrap();
        assert!(!root.join("5/12").exists());

        service.remove_user_dir(5).await.unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }
}
