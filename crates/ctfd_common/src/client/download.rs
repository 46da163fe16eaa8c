// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use super::CtfdClient;
use crate::error::ClientError;
use futures::StreamExt;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// Downloads are written and reported in pieces of this size.
pub const CHUNK_SIZE: usize = 8192;

/// Receives download progress. Reporting is best-effort and never affects the write.
pub trait DownloadProgress {
    /// Called once before the first chunk, with the advertised content length if any.
    fn start(&self, _total: Option<u64>) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

impl DownloadProgress for () {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub written: u64,
    /// The advertised content length
    pub expected: Option<u64>,
}

impl CtfdClient {
    /// Streams an attachment to `dest`, overwriting it. `endpoint` is either a path relative to
    /// the platform root, as listed in a challenge's files, or an absolute URL.
    pub async fn download_file<P: AsRef<Path>>(
        &self,
        endpoint: &str,
        dest: P,
        progress: &dyn DownloadProgress,
    ) -> Result<DownloadReport, ClientError> {
        let dest = dest.as_ref();
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            self.session.endpoint(endpoint)
        };

        let client = if same_origin(&url, self.session.base_url()) {
            &self.client
        } else {
            debug!(%url, "the attachment is hosted elsewhere, sending it without the token");
            &self.anonymous
        };

        debug!(%url, dest = %dest.display(), "downloading file");
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { url, status });
        }

        let expected = response.content_length();
        progress.start(expected);

        let file = fs::File::create(dest).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for piece in chunk.chunks(CHUNK_SIZE) {
                writer.write_all(piece).await?;
                written += piece.len() as u64;
                progress.advance(piece.len() as u64);
            }
        }
        writer.flush().await?;
        progress.finish();

        if let Some(expected) = expected {
            if expected != written {
                warn!(expected, written, %url, "the download size differs from the content length");
            }
        }

        Ok(DownloadReport {
            path: dest.to_path_buf(),
            written,
            expected,
        })
    }
}

/// Whether both URLs share scheme, host and port. Unparsable URLs never match.
fn same_origin(url: &str, base: &str) -> bool {
    match (Url::parse(url), Url::parse(base)) {
        (Ok(url), Ok(base)) => url.origin() == base.origin(),
        _ => false,
    }
}

/// The local file name of an attachment: the last path segment with the query removed.
pub fn file_name_from_url(endpoint: &str) -> Option<String> {
    let path = endpoint
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{file_name_from_url, same_origin};

    #[test]
    fn should_strip_query_from_file_name() {
        assert_eq!(
            file_name_from_url("/files/3d1f0a/chall.tar.gz?token=eyJ1c2VyX2lk"),
            Some("chall.tar.gz".to_string())
        );
        assert_eq!(
            file_name_from_url("https://cdn.example.com/a/b/libc.so.6"),
            Some("libc.so.6".to_string())
        );
    }

    #[test]
    fn should_reject_unusable_file_names() {
        assert_eq!(file_name_from_url("/files/abc/"), None);
        assert_eq!(file_name_from_url("/files/.."), None);
        assert_eq!(file_name_from_url("?token=1"), None);
    }

    #[test]
    fn should_compare_attachment_origins() {
        let base = "http://ctf.example.com:8000";

        assert!(same_origin("http://ctf.example.com:8000/files/a/b.zip?token=x", base));
        assert!(!same_origin("http://ctf.example.com/files/a/b.zip", base));
        assert!(!same_origin("https://ctf.example.com:8000/files/a/b.zip", base));
        assert!(!same_origin(
            "https://bucket.s3.amazonaws.com/chall.zip?X-Amz-Signature=abc",
            base
        ));
        assert!(!same_origin("not a url", base));
    }
}
