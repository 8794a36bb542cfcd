//! Shared test helpers: in-memory blob store and tiny image builders.

use std::collections::HashMap;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tokio::sync::RwLock;

use crate::blobstore::{BlobError, BlobStore};

/// In-memory blob store for tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.blobs.read().await.contains_key(key))
    }
}

/// PNG bytes of a single-color image.
pub fn solid_image_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// PNG bytes of an image split into four solid quadrants.
///
/// Gives the pipeline four well-separated colors and four clean regions,
/// which is enough for every stage to produce meaningful output.
pub fn quadrant_image_png(width: u32, height: u32) -> Vec<u8> {
    let colors = [
        Rgb([220u8, 40, 40]),
        Rgb([40u8, 180, 60]),
        Rgb([40u8, 70, 220]),
        Rgb([235u8, 210, 60]),
    ];
    let img = RgbImage::from_fn(width, height, |x, y| {
        let right = x >= width / 2;
        let bottom = y >= height / 2;
        colors[(bottom as usize) * 2 + right as usize]
    });
    encode(img)
}

fn encode(img: RgbImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encoding a fresh RgbImage cannot fail");
    buf.into_inner()
}
