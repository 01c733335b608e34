//! HTTP file downloader with resume support.
//!
//! Files are only ever appended to. A partial file left by an earlier run
//! is continued with a `Range: bytes=<local size>-` request, and a file
//! whose local size already reaches the remote size is left alone.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::job::{DownloadJob, DownloadOutcome, PreparedDownload, UnknownSizePolicy};
use crate::error::{VaultError, VaultResult};
use crate::session::{RequestHeaders, Session};

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Status for a partial-content reply.
const PARTIAL_CONTENT: u16 = 206;

/// Status for a range starting at or beyond the end of the file.
const RANGE_NOT_SATISFIABLE: u16 = 416;

/// Progress callback receiving `(bytes on disk, remote size if known)`.
pub type ProgressCallback = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Resumable downloader bound to one session.
pub struct ResumableDownloader<'a> {
    session: &'a Session,
    unknown_size: UnknownSizePolicy,
    progress: Option<ProgressCallback>,
}

impl<'a> ResumableDownloader<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            unknown_size: UnknownSizePolicy::default(),
            progress: None,
        }
    }

    /// Set how files of unknown remote size are treated.
    pub fn with_unknown_size_policy(mut self, policy: UnknownSizePolicy) -> Self {
        self.unknown_size = policy;
        self
    }

    /// Report progress while streaming.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Retrieve one file, resuming any partial local copy.
    ///
    /// Calling this again on a complete file does no transfer. No file is
    /// created when the filename cannot be determined or the server
    /// rejects the request.
    pub fn download(&self, job: &DownloadJob) -> VaultResult<DownloadOutcome> {
        let prepared = self.prepare(job)?;
        self.transfer(&prepared)
    }

    /// Probe the remote file and settle the local file name.
    ///
    /// The explicit name of the job wins over the name the server offers.
    pub fn prepare(&self, job: &DownloadJob) -> VaultResult<PreparedDownload> {
        let url = job.url.as_str();
        let meta = self
            .session
            .probe_metadata(url, &RequestHeaders::accept_any())?;
        let filename = job
            .filename
            .clone()
            .or(meta.filename)
            .ok_or_else(|| VaultError::NoFilenameAvailable {
                url: url.to_string(),
            })?;

        Ok(PreparedDownload {
            url: url.to_string(),
            destination: job.destination.clone(),
            filename,
            remote_size: meta.size,
        })
    }

    /// Bring the local file of a prepared download up to the remote size.
    pub fn transfer(&self, prepared: &PreparedDownload) -> VaultResult<DownloadOutcome> {
        let headers = RequestHeaders::accept_any();
        let url = prepared.url.as_str();
        let path = prepared.path();
        let remote_size = prepared.remote_size;
        let offset = local_size(&path)?;

        let complete = match remote_size {
            Some(total) => offset >= total,
            None => self.unknown_size == UnknownSizePolicy::SkipExisting && offset > 0,
        };
        if complete {
            info!(path = %path.display(), bytes = offset, "Already downloaded");
            self.report(offset, remote_size);
            return Ok(DownloadOutcome::AlreadyComplete {
                path,
                bytes: offset,
            });
        }

        let response = self.session.open_range(url, offset, &headers)?;
        match response.status {
            PARTIAL_CONTENT => {}
            200 if offset == 0 => {}
            200 => {
                return Err(VaultError::RangeNotHonoured {
                    url: url.to_string(),
                    offset,
                })
            }
            RANGE_NOT_SATISFIABLE if offset > 0 && remote_size.is_none() => {
                info!(
                    path = %path.display(),
                    bytes = offset,
                    "Server has no bytes past local size, treating as complete"
                );
                self.report(offset, remote_size);
                return Ok(DownloadOutcome::AlreadyComplete {
                    path,
                    bytes: offset,
                });
            }
            status => {
                return Err(VaultError::HttpStatus {
                    url: url.to_string(),
                    status,
                })
            }
        }

        debug!(
            url,
            path = %path.display(),
            resumed_from = offset,
            total = ?remote_size,
            "Starting transfer"
        );

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| VaultError::storage(&path, e))?;

        let written = self.stream(url, &path, response.body, file, offset, remote_size)?;

        info!(path = %path.display(), resumed_from = offset, written, "Download finished");
        Ok(DownloadOutcome::Transferred {
            path,
            resumed_from: offset,
            written,
            total: remote_size,
        })
    }

    /// Copy the body into the file, flushing whatever arrived even when
    /// the stream breaks.
    fn stream(
        &self,
        url: &str,
        path: &Path,
        mut body: Box<dyn Read + Send>,
        file: fs::File,
        offset: u64,
        remote_size: Option<u64>,
    ) -> VaultResult<u64> {
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut written = 0u64;

        let copied = loop {
            let bytes_read = match body.read(&mut buffer) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    break Err(VaultError::Transport {
                        url: url.to_string(),
                        reason: format!("read error: {}", e),
                    })
                }
            };

            if let Err(e) = writer.write_all(&buffer[..bytes_read]) {
                break Err(VaultError::storage(path, e));
            }
            written += bytes_read as u64;
            self.report(offset + written, remote_size);
        };

        let flushed = writer.flush().map_err(|e| VaultError::storage(path, e));
        copied?;
        flushed?;
        Ok(written)
    }

    fn report(&self, downloaded: u64, total: Option<u64>) {
        if let Some(cb) = &self.progress {
            cb(downloaded, total);
        }
    }
}

/// Size of an existing local file, or 0 when there is none.
fn local_size(path: &Path) -> VaultResult<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(VaultError::storage(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::session::mock::{MockFile, MockTransport};

    const URL: &str = "https://storage.example.com/games/1/download";

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn session(mock: &MockTransport) -> Session {
        Session::with_user_agent(mock.clone(), "agent/1.0")
    }

    #[test]
    fn test_fresh_download() {
        let dir = TempDir::new().unwrap();
        let data = payload(200_000);
        let mock = MockTransport::new().with_file(URL, MockFile::new(data.clone()).named("game.zip"));
        let session = session(&mock);

        let outcome = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap();

        let path = dir.path().join("game.zip");
        assert_eq!(fs::read(&path).unwrap(), data);
        assert_eq!(
            outcome,
            DownloadOutcome::Transferred {
                path,
                resumed_from: 0,
                written: 200_000,
                total: Some(200_000),
            }
        );
    }

    #[test]
    fn test_resume_requests_from_local_size() {
        let dir = TempDir::new().unwrap();
        let data = payload(10_000);
        fs::write(dir.path().join("game.zip"), &data[..4_000]).unwrap();
        let mock = MockTransport::new().with_file(URL, MockFile::new(data.clone()).named("game.zip"));
        let session = session(&mock);

        let outcome = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap();

        let get = mock
            .requests_for(URL)
            .into_iter()
            .find(|r| r.method == crate::session::Method::Get)
            .unwrap();
        assert_eq!(get.range_start, Some(4_000));
        assert_eq!(outcome.bytes_transferred(), 6_000);
        assert_eq!(fs::read(dir.path().join("game.zip")).unwrap(), data);
    }

    #[test]
    fn test_second_call_is_noop() {
        let dir = TempDir::new().unwrap();
        let data = payload(5_000);
        let mock = MockTransport::new().with_file(URL, MockFile::new(data.clone()).named("game.zip"));
        let session = session(&mock);
        let downloader = ResumableDownloader::new(&session);
        let job = DownloadJob::new(URL, dir.path());

        downloader.download(&job).unwrap();
        let served = mock.body_bytes_served();

        let outcome = downloader.download(&job).unwrap();
        assert!(matches!(outcome, DownloadOutcome::AlreadyComplete { bytes: 5_000, .. }));
        assert_eq!(mock.body_bytes_served(), served);
        assert_eq!(fs::read(dir.path().join("game.zip")).unwrap(), data);
    }

    #[test]
    fn test_explicit_filename_wins() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransport::new().with_file(URL, MockFile::new(payload(10)).named("server.zip"));
        let session = session(&mock);

        let outcome = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path()).with_filename("mine.zip"))
            .unwrap();
        assert_eq!(outcome.path(), dir.path().join("mine.zip"));
        assert!(!dir.path().join("server.zip").exists());
    }

    #[test]
    fn test_no_filename_fails_without_writing() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransport::new().with_file(URL, MockFile::new(payload(10)));
        let session = session(&mock);

        let err = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap_err();
        assert!(matches!(err, VaultError::NoFilenameAvailable { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(mock.body_bytes_served(), 0);
    }

    #[test]
    fn test_broken_stream_keeps_flushed_bytes_and_resumes() {
        let dir = TempDir::new().unwrap();
        let data = payload(100_000);
        let path = dir.path().join("game.zip");

        let broken = MockTransport::new().with_file(
            URL,
            MockFile::new(data.clone()).named("game.zip").failing_after(30_000),
        );
        let broken_session = session(&broken);
        let err = ResumableDownloader::new(&broken_session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(fs::metadata(&path).unwrap().len(), 30_000);

        let healthy = MockTransport::new().with_file(URL, MockFile::new(data.clone()).named("game.zip"));
        let healthy_session = session(&healthy);
        ResumableDownloader::new(&healthy_session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), data);
    }

    #[test]
    fn test_unknown_size_resumes_and_treats_416_as_complete() {
        let dir = TempDir::new().unwrap();
        let data = payload(1_000);
        fs::write(dir.path().join("game.zip"), &data).unwrap();
        let mock = MockTransport::new()
            .with_file(URL, MockFile::new(data.clone()).named("game.zip").without_size());
        let session = session(&mock);

        let outcome = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap();
        assert!(matches!(outcome, DownloadOutcome::AlreadyComplete { bytes: 1_000, .. }));
        assert_eq!(fs::read(dir.path().join("game.zip")).unwrap(), data);
    }

    #[test]
    fn test_unknown_size_skip_existing_policy() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("game.zip"), b"partial").unwrap();
        let mock = MockTransport::new()
            .with_file(URL, MockFile::new(payload(1_000)).named("game.zip").without_size());
        let session = session(&mock);

        let outcome = ResumableDownloader::new(&session)
            .with_unknown_size_policy(UnknownSizePolicy::SkipExisting)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap();
        assert!(matches!(outcome, DownloadOutcome::AlreadyComplete { bytes: 7, .. }));
        assert!(mock
            .requests()
            .iter()
            .all(|r| r.method == crate::session::Method::Head));
    }

    #[test]
    fn test_ignored_range_is_rejected_without_touching_file() {
        let dir = TempDir::new().unwrap();
        let data = payload(1_000);
        fs::write(dir.path().join("game.zip"), &data[..100]).unwrap();
        let mock = MockTransport::new()
            .with_file(URL, MockFile::new(data).named("game.zip").ignoring_range());
        let session = session(&mock);

        let err = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap_err();
        assert!(matches!(err, VaultError::RangeNotHonoured { offset: 100, .. }));
        assert_eq!(fs::metadata(dir.path().join("game.zip")).unwrap().len(), 100);
    }

    #[test]
    fn test_missing_destination_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransport::new().with_file(URL, MockFile::new(payload(10)).named("game.zip"));
        let session = session(&mock);

        let err = ResumableDownloader::new(&session)
            .download(&DownloadJob::new(URL, dir.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, VaultError::Storage { .. }));
    }

    #[test]
    fn test_progress_reaches_total() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransport::new().with_file(URL, MockFile::new(payload(150_000)).named("a.bin"));
        let session = session(&mock);
        let last = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&last);

        ResumableDownloader::new(&session)
            .with_progress(Box::new(move |done, total| {
                assert_eq!(total, Some(150_000));
                seen.store(done, Ordering::SeqCst);
            }))
            .download(&DownloadJob::new(URL, dir.path()))
            .unwrap();
        assert_eq!(last.load(Ordering::SeqCst), 150_000);
    }

    #[test]
    fn test_prepare_settles_name_without_transfer() {
        let dir = TempDir::new().unwrap();
        let mock = MockTransport::new().with_file(URL, MockFile::new(payload(64)).named("game.zip"));
        let session = session(&mock);
        let downloader = ResumableDownloader::new(&session);

        let prepared = downloader.prepare(&DownloadJob::new(URL, dir.path())).unwrap();
        assert_eq!(prepared.filename, "game.zip");
        assert_eq!(prepared.remote_size, Some(64));
        assert_eq!(mock.body_bytes_served(), 0);
        assert!(!prepared.path().exists());

        let outcome = downloader.transfer(&prepared.renamed("game (2).zip")).unwrap();
        assert_eq!(outcome.path(), dir.path().join("game (2).zip"));
        assert_eq!(fs::read(dir.path().join("game (2).zip")).unwrap(), payload(64));
    }
}
