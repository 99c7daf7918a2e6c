//! Generated video storage.
//!
//! Videos live flat in one directory, one file per session and variant:
//! `session_<id>.mp4`, `session_<id>_simple.mp4` and
//! `session_<id>_real_browser.mp4`. Replay generation writes the
//! `real_browser` variant.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flowreplay_recorder::SessionId;

use crate::error::StoreError;

const VIDEO_VARIANTS: [&str; 3] = ["", "_simple", "_real_browser"];
const CLEARED_EXTENSIONS: [&str; 2] = ["mp4", "avi"];

/// Headers attached to every served video.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const VIDEO_CACHE_CONTROL: &str = "public, max-age=3600";

/// Directory of generated videos plus the URL prefix it is served under.
#[derive(Clone, Debug)]
pub struct VideoStore {
    dir: PathBuf,
    public_prefix: String,
}

/// A served video, full or partial.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoResponse {
    /// 200 for the whole file, 206 for a range.
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl VideoResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl VideoStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(id: SessionId, variant: &str) -> String {
        format!("session_{id}{variant}.mp4")
    }

    /// Where replay generation writes the session's video.
    pub fn output_path(&self, id: SessionId) -> PathBuf {
        self.dir.join(Self::file_name(id, "_real_browser"))
    }

    /// URL path of the generated video.
    pub fn public_path(&self, id: SessionId) -> String {
        format!("{}/{}", self.public_prefix, Self::file_name(id, "_real_browser"))
    }

    /// The session's video, preferring the plain variant, then `_simple`,
    /// then `_real_browser`.
    pub fn find(&self, id: SessionId) -> Option<PathBuf> {
        VIDEO_VARIANTS
            .iter()
            .map(|variant| self.dir.join(Self::file_name(id, variant)))
            .find(|path| path.is_file())
    }

    /// Remove every variant of the session's video. Returns how many files
    /// were removed.
    pub fn delete(&self, id: SessionId) -> Result<usize, StoreError> {
        let mut removed = 0;
        for variant in VIDEO_VARIANTS {
            let path = self.dir.join(Self::file_name(id, variant));
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
        tracing::debug!(session = id, removed, "Deleted session videos");
        Ok(removed)
    }

    /// Remove all `.mp4` and `.avi` files in the store. Hidden files are
    /// in-progress writes of a running generation and are left alone.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            let hidden = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(true, |name| name.starts_with('.'));
            let is_video = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CLEARED_EXTENSIONS.contains(&ext));
            if is_video && !hidden && path.is_file() {
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                removed += 1;
            }
        }
        tracing::info!(dir = %self.dir.display(), removed, "Cleared videos");
        Ok(removed)
    }

    /// Serve the session's video, honoring a single `Range: bytes=...`
    /// header.
    pub fn serve(&self, id: SessionId, range: Option<&str>) -> Result<VideoResponse, StoreError> {
        let path = self.find(id).ok_or(StoreError::NotFound)?;
        let mut file = File::open(&path).map_err(|e| StoreError::io(&path, e))?;
        let size = file
            .metadata()
            .map_err(|e| StoreError::io(&path, e))?
            .len();

        let mut headers = vec![
            ("Content-Type", VIDEO_CONTENT_TYPE.to_string()),
            ("Accept-Ranges", "bytes".to_string()),
            ("Cache-Control", VIDEO_CACHE_CONTROL.to_string()),
        ];

        let Some(range) = range else {
            let mut body = Vec::with_capacity(size as usize);
            file.read_to_end(&mut body)
                .map_err(|e| StoreError::io(&path, e))?;
            headers.push(("Content-Length", body.len().to_string()));
            return Ok(VideoResponse {
                status: 200,
                headers,
                body,
            });
        };

        let (start, end) = parse_range(range, size).ok_or(StoreError::RangeNotSatisfiable { size })?;
        let len = end - start + 1;
        let mut body = vec![0; len as usize];
        file.seek(SeekFrom::Start(start))
            .and_then(|_| file.read_exact(&mut body))
            .map_err(|e| StoreError::io(&path, e))?;

        headers.push(("Content-Range", format!("bytes {start}-{end}/{size}")));
        headers.push(("Content-Length", len.to_string()));
        Ok(VideoResponse {
            status: 206,
            headers,
            body,
        })
    }
}

/// Parse `bytes=start-end`, `bytes=start-` or `bytes=-suffix` against a
/// file of `size` bytes into an inclusive range.
fn parse_range(header: &str, size: u64) -> Option<(u64, u64)> {
    let spec = header.trim().strip_prefix("bytes=")?;
    if spec.contains(',') || size == 0 {
        return None;
    }
    let (start, end) = spec.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    let (start, end) = if start.is_empty() {
        let suffix: u64 = end.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        (size.saturating_sub(suffix), size - 1)
    } else {
        let start: u64 = start.parse().ok()?;
        let end = if end.is_empty() {
            size - 1
        } else {
            end.parse::<u64>().ok()?.min(size - 1)
        };
        (start, end)
    };

    (start <= end && start < size).then_some((start, end))
}
