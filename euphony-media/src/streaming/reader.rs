//! Bounded-memory chunked file reader

use super::range::StreamingPlan;
use crate::error::{MediaError, MediaResult};
use bytes::{Bytes, BytesMut};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

/// Reads the window of a [`StreamingPlan`] in chunks of at most `buffer_size`
///
/// Memory use is bounded by the buffer size regardless of file length.
#[derive(Debug)]
pub struct RangeReader {
    file: File,
    remaining: u64,
    buffer_size: usize,
}

impl RangeReader {
    /// Opens `path` and positions it at `plan.start`
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::NotFound`] if the file is missing, or
    /// [`MediaError::Io`] if it cannot be opened or seeked.
    pub async fn open(path: &Path, plan: &StreamingPlan, buffer_size: usize) -> MediaResult<Self> {
        let mut file = File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::NotFound(path.display().to_string())
            } else {
                MediaError::io("Failed to open the file for streaming", e)
            }
        })?;

        if plan.start > 0 {
            file.seek(SeekFrom::Start(plan.start))
                .await
                .map_err(|e| MediaError::io("Failed to seek in the file", e))?;
        }

        Ok(Self {
            file,
            remaining: plan.content_length,
            buffer_size: buffer_size.max(1),
        })
    }

    /// Bytes still owed to the client
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Reads the next chunk, or `None` once the window or the file is exhausted
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Io`] if the read fails.
    pub async fn next_chunk(&mut self) -> MediaResult<Option<Bytes>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let want = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(self.buffer_size);
        let mut buf = BytesMut::zeroed(want);
        let read = self
            .file
            .read(&mut buf)
            .await
            .map_err(|e| MediaError::io("Failed to read the file", e))?;

        if read == 0 {
            tracing::warn!(
                remaining = self.remaining,
                "File ended before the planned range was served"
            );
            self.remaining = 0;
            return Ok(None);
        }

        buf.truncate(read);
        self.remaining -= read as u64;
        Ok(Some(buf.freeze()))
    }
}

/// Copies the planned window of `path` into `sink`
///
/// Returns the number of bytes written, which is less than
/// `plan.content_length` only if the file shrank underneath the request.
///
/// # Errors
///
/// - [`MediaError::NotFound`] if the file is missing before streaming begins
/// - [`MediaError::ClientAborted`] if writing to the sink fails; never retried
/// - [`MediaError::Io`] for read failures
pub async fn stream<W>(
    path: &Path,
    plan: &StreamingPlan,
    sink: &mut W,
    buffer_size: usize,
) -> MediaResult<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut reader = RangeReader::open(path, plan, buffer_size).await?;
    let mut written = 0u64;

    while let Some(chunk) = reader.next_chunk().await? {
        sink.write_all(&chunk).await.map_err(client_aborted)?;
        written += chunk.len() as u64;
    }
    sink.flush().await.map_err(client_aborted)?;

    tracing::trace!(path = %path.display(), written, "Finished streaming");
    Ok(written)
}

fn client_aborted(error: std::io::Error) -> MediaError {
    tracing::debug!(error = %error, "Client went away mid-stream");
    MediaError::ClientAborted(error)
}
