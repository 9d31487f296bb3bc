use std::io;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image source is empty")]
    EmptySource,
    #[error("malformed data url")]
    MalformedDataUrl,
    #[error("unsupported image source scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Where image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl ImageSource {
    /// Accepts `data:` URLs, `file://` URLs and bare filesystem paths.
    pub fn parse(source: &str) -> LoadResult<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(LoadError::EmptySource);
        }
        if let Some(rest) = source.strip_prefix("data:") {
            let (meta, payload) = rest.split_once(',').ok_or(LoadError::MalformedDataUrl)?;
            let bytes = if meta.ends_with(";base64") {
                STANDARD.decode(payload)?
            } else {
                payload.as_bytes().to_vec()
            };
            return Ok(Self::Bytes(bytes));
        }
        if let Some(path) = source.strip_prefix("file://") {
            return Ok(Self::Path(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = source.split_once("://") {
            return Err(LoadError::UnsupportedScheme(scheme.to_string()));
        }
        Ok(Self::Path(PathBuf::from(source)))
    }

    pub fn decode(&self) -> LoadResult<RgbaImage> {
        let decoded = match self {
            Self::Bytes(bytes) => image::load_from_memory(bytes)?,
            Self::Path(path) => {
                let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                image::load_from_memory(&bytes)?
            }
        };
        Ok(decoded.to_rgba8())
    }
}

/// Decoded image owned by the surface. `id` is the load generation that
/// produced it, so hosts can cache derived resources per image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: u64,
    pub pixels: RgbaImage,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// A pending load. Decoding is `Send` and may run off the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub source: String,
}

impl LoadRequest {
    pub fn decode(self) -> LoadCompletion {
        let result = ImageSource::parse(&self.source).and_then(|source| source.decode());
        LoadCompletion {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub generation: u64,
    pub result: LoadResult<RgbaImage>,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applied { width: u32, height: u32 },
    /// A newer load was issued after this one; its result was discarded.
    Superseded,
    Failed(LoadError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut image = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = image::Rgba([(x * 40) as u8, (y * 40) as u8, 90, 255]);
    }
    let mut bytes = Vec::new();
    image
        .write_to(&mut io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encoding should succeed");
    bytes
}

#[cfg(test)]
pub(crate) fn png_data_url(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_base64_data_url() {
        let source = ImageSource::parse(&png_data_url(3, 2)).expect("data url should parse");
        let image = source.decode().expect("png payload should decode");
        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn parse_rejects_data_url_without_payload_separator() {
        let err = ImageSource::parse("data:image/png;base64").expect_err("missing comma");
        assert!(matches!(err, LoadError::MalformedDataUrl));
    }

    #[test]
    fn parse_rejects_network_and_empty_sources() {
        let err = ImageSource::parse("https://example.com/cat.png").expect_err("network");
        assert!(matches!(err, LoadError::UnsupportedScheme(scheme) if scheme == "https"));

        let err = ImageSource::parse("   ").expect_err("blank source");
        assert!(matches!(err, LoadError::EmptySource));
    }

    #[test]
    fn parse_maps_file_urls_and_bare_paths() {
        assert_eq!(
            ImageSource::parse("file:///tmp/a.png").expect("file url"),
            ImageSource::Path(PathBuf::from("/tmp/a.png"))
        );
        assert_eq!(
            ImageSource::parse("pictures/b.png").expect("relative path"),
            ImageSource::Path(PathBuf::from("pictures/b.png"))
        );
    }

    #[test]
    fn decode_reads_image_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sample.png");
        std::fs::write(&path, png_bytes(5, 4)).expect("write sample");

        let image = ImageSource::Path(path).decode().expect("file should decode");
        assert_eq!(image.dimensions(), (5, 4));
    }

    #[test]
    fn decode_reports_missing_file_and_garbage_bytes() {
        let err = ImageSource::Path(PathBuf::from("/definitely/not/here.png"))
            .decode()
            .expect_err("missing file");
        assert!(matches!(err, LoadError::Io { .. }));

        let err = ImageSource::Bytes(b"not an image".to_vec())
            .decode()
            .expect_err("garbage bytes");
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn request_decode_carries_generation() {
        let completion = LoadRequest {
            generation: 7,
            source: png_data_url(2, 2),
        }
        .decode();
        assert_eq!(completion.generation, 7);
        assert!(completion.result.is_ok());
    }
}
