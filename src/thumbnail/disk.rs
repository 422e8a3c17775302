use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::app::Result;

const FILE_PREFIX: &str = "thumb_";
const FILE_SUFFIX: &str = ".jpg";
const PARTIAL_EXTENSION: &str = "jpg.part";

/// Unbounded disk tier, one JPEG per item ID.
///
/// Stores the thumbnail exactly as downloaded; overlays are never written here.
#[derive(Debug, Clone)]
pub struct DiskTier {
    dir: PathBuf,
    quality: u8,
}

impl DiskTier {
    pub fn new(dir: impl Into<PathBuf>, quality: u8) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!("thumbnail disk cache: {}", dir.display());
        Ok(Self { dir, quality })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}{}{}", FILE_PREFIX, id, FILE_SUFFIX))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.path(id).exists()
    }

    /// Decode the cached file. Missing or unreadable files are a miss.
    pub fn load(&self, id: u64) -> Option<DynamicImage> {
        let path = self.path(id);
        if !path.exists() {
            return None;
        }

        match image::open(&path) {
            Ok(image) => {
                tracing::debug!("thumbnail {} loaded from disk cache", id);
                Some(image)
            }
            Err(e) => {
                tracing::warn!("unable to decode {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Encode as JPEG, whatever the source format was.
    pub fn store(&self, id: u64, image: &DynamicImage) -> Result<()> {
        let path = self.path(id);
        let partial = path.with_extension(PARTIAL_EXTENSION);

        let written = self
            .write_jpeg(&partial, image)
            .and_then(|()| fs::rename(&partial, &path).map_err(Into::into));
        if written.is_err() {
            let _ = fs::remove_file(&partial);
        }
        written?;

        tracing::debug!("thumbnail {} saved to disk cache", id);
        Ok(())
    }

    fn write_jpeg(&self, path: &Path, image: &DynamicImage) -> Result<()> {
        let mut writer = BufWriter::new(fs::File::create(path)?);
        JpegEncoder::new_with_quality(&mut writer, self.quality).encode_image(&image.to_rgb8())?;
        writer.flush()?;
        Ok(())
    }

    /// Remove every cached thumbnail, returns how many files were deleted.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(FILE_PREFIX) {
                continue;
            }
            if name.ends_with(FILE_SUFFIX) {
                fs::remove_file(entry.path())?;
                removed += 1;
            } else if name.ends_with(PARTIAL_EXTENSION) {
                // left over by an interrupted write
                fs::remove_file(entry.path())?;
            }
        }
        Ok(removed)
    }
}
