//! FrameGrabber - Still Frame Capture from MJPEG Streams
//!
//! ## Responsibilities
//!
//! - Load a camera's stream resource (mount-time health signal)
//! - Cut the first complete JPEG out of a `multipart/x-mixed-replace` stream
//! - Encode frames as `data:` URLs for the analysis endpoint

use crate::error::{Error, Result};
use crate::models::Camera;
use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use std::time::Duration;

/// JPEG start-of-image marker
const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker
const EOI: [u8; 2] = [0xFF, 0xD9];
/// Give up if no complete frame shows up within this many bytes
const MAX_FRAME_SCAN: usize = 8 * 1024 * 1024;
/// How far back from a frame's SOI part headers are searched
const PART_HEADER_WINDOW: usize = 1024;

/// Source of still frames for a camera
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Load the stream resource once; an error means the stream failed to load
    async fn probe(&self, camera: &Camera) -> Result<()>;

    /// Capture the current frame as JPEG bytes
    async fn capture(&self, camera: &Camera) -> Result<Vec<u8>>;
}

/// HTTP MJPEG frame grabber
pub struct MjpegGrabber {
    client: reqwest::Client,
    stream_url: String,
}

impl MjpegGrabber {
    /// Create new grabber; `timeout` bounds connect and frame extraction
    pub fn new(stream_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self { client, stream_url })
    }

    /// Stream URL for a camera
    pub fn stream_src(&self, camera_id: &str) -> String {
        let sep = if self.stream_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}camera_id={}",
            self.stream_url,
            sep,
            urlencoding::encode(camera_id)
        )
    }

    async fn open(&self, camera: &Camera) -> Result<reqwest::Response> {
        let resp = self.client.get(self.stream_src(&camera.camera_id)).send().await?;

        if !resp.status().is_success() {
            return Err(Error::Api {
                status: resp.status().as_u16(),
                message: format!("stream for camera {} failed to load", camera.camera_id),
            });
        }

        Ok(resp)
    }
}

#[async_trait]
impl FrameSource for MjpegGrabber {
    async fn probe(&self, camera: &Camera) -> Result<()> {
        let resp = self.open(camera).await?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if !content_type.is_empty()
            && !content_type.starts_with("multipart/")
            && !content_type.starts_with("image/")
        {
            return Err(Error::Capture(format!(
                "unexpected stream content type: {}",
                content_type
            )));
        }

        tracing::debug!(camera_id = %camera.camera_id, content_type = %content_type, "Stream loaded");
        Ok(())
    }

    async fn capture(&self, camera: &Camera) -> Result<Vec<u8>> {
        let resp = self.open(camera).await?;
        let mut stream = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut scanner = FrameScanner::default();

        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);

            if let Some((start, end)) = scanner.scan(&buf) {
                tracing::debug!(
                    camera_id = %camera.camera_id,
                    size = end - start,
                    "Frame captured"
                );
                return Ok(buf[start..end].to_vec());
            }

            if buf.len() > MAX_FRAME_SCAN {
                return Err(Error::Capture(format!(
                    "no complete frame within {} bytes",
                    MAX_FRAME_SCAN
                )));
            }
        }

        Err(Error::Capture("stream ended before a complete frame".to_string()))
    }
}

/// Incremental cutter for the first JPEG of a multipart MJPEG body
///
/// Feed it the same append-only buffer after every chunk; scanning resumes
/// where the previous call stopped. A `Content-Length` part header, when
/// present, decides the frame size. Otherwise the JPEG segment structure is
/// walked so markers inside APPn payloads (EXIF thumbnails) are skipped.
#[derive(Debug, Default)]
pub struct FrameScanner {
    /// SOI offset once found
    start: Option<usize>,
    /// Frame size declared by the part headers
    declared: Option<usize>,
    /// Resume offset
    cursor: usize,
    /// Inside entropy-coded scan data
    entropy: bool,
}

impl FrameScanner {
    /// `start..end` of the first complete frame in `buf`
    pub fn scan(&mut self, buf: &[u8]) -> Option<(usize, usize)> {
        let start = match self.start {
            Some(start) => start,
            None => {
                let Some(start) = find_marker(buf, SOI, self.cursor) else {
                    // keep a trailing 0xFF, it may open the SOI
                    self.cursor = buf.len().saturating_sub(1);
                    return None;
                };
                self.start = Some(start);
                self.declared = declared_length(&buf[..start]).filter(|&len| len >= SOI.len());
                self.cursor = start + SOI.len();
                start
            }
        };

        if let Some(len) = self.declared {
            return (buf.len() >= start + len).then_some((start, start + len));
        }

        loop {
            if self.entropy {
                match self.scan_entropy(buf) {
                    Some(end) => return Some((start, end)),
                    None if self.entropy => return None,
                    None => continue,
                }
            }

            let (Some(&lead), Some(&marker)) = (buf.get(self.cursor), buf.get(self.cursor + 1))
            else {
                return None;
            };

            if lead != 0xFF {
                // not a segment boundary, fall back to a plain EOI search
                self.entropy = true;
                continue;
            }

            match marker {
                0xFF => self.cursor += 1,
                0xD9 => return Some((start, self.cursor + EOI.len())),
                0x01 | 0xD0..=0xD7 => self.cursor += 2,
                _ => {
                    let len_bytes = buf.get(self.cursor + 2..self.cursor + 4)?;
                    let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
                    if len < 2 {
                        self.cursor += 2;
                        self.entropy = true;
                        continue;
                    }
                    self.cursor += 2 + len;
                    // SOS: entropy-coded data follows its header
                    self.entropy = marker == 0xDA;
                }
            }
        }
    }

    /// Scan entropy data for EOI; leaves entropy mode on any other marker
    fn scan_entropy(&mut self, buf: &[u8]) -> Option<usize> {
        let mut i = self.cursor;
        while i + 1 < buf.len() {
            if buf[i] != 0xFF {
                i += 1;
                continue;
            }
            match buf[i + 1] {
                0x00 | 0xD0..=0xD7 => i += 2,
                0xFF => i += 1,
                0xD9 => return Some(i + EOI.len()),
                _ => {
                    self.cursor = i;
                    self.entropy = false;
                    return None;
                }
            }
        }
        self.cursor = i;
        None
    }
}

/// `Content-Length` of the part whose headers end right before `head`'s end
fn declared_length(head: &[u8]) -> Option<usize> {
    let head = head
        .strip_suffix(b"\r\n\r\n")
        .or_else(|| head.strip_suffix(b"\n\n"))?;
    let window = &head[head.len().saturating_sub(PART_HEADER_WINDOW)..];
    let text = String::from_utf8_lossy(window);

    for line in text.lines().rev() {
        let line = line.trim();
        if line.starts_with("--") {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Locate the first complete JPEG in `buf`, as a `start..end` byte range
pub fn find_jpeg(buf: &[u8]) -> Option<(usize, usize)> {
    FrameScanner::default().scan(buf)
}

fn find_marker(buf: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| pos + from)
}

/// Encode JPEG bytes as a `data:image/jpeg;base64,...` URL
pub fn to_data_url(jpeg: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    )
}
