//! Media extractor seam and the yt-dlp CLI implementation.
//!
//! Extraction is fully delegated: the crate only needs metadata, direct URLs,
//! and downloaded files. [`MediaExtractor`] is the trait boundary; the
//! production implementation shells out to a `yt-dlp` binary discovered on
//! PATH and parses its `--newline` progress stream into [`RawProgress`]
//! samples.

use crate::error::{Error, Result};
use crate::policy::FetchOptions;
use crate::progress::ProgressSink;
use crate::types::{DirectUrlInfo, LocalFile, Metadata, RawProgress};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::LazyLock;
use tokio::io::AsyncBufReadExt;

/// Browser user agent sent upstream to avoid trivial blocking
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How long direct source URLs are assumed to stay valid
const DIRECT_URL_TTL_SECS: u64 = 3600;

/// Per-fragment retries delegated to yt-dlp itself (inner retries, distinct
/// from the runner's whole-job retries)
const INNER_RETRIES: &str = "10";

#[allow(clippy::expect_used)]
static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("static regex is valid")
});

/// External collaborator providing metadata, direct URLs, and file retrieval
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Fetch video metadata without downloading
    async fn fetch_metadata(&self, url: &str) -> Result<Metadata>;

    /// Resolve a direct source URL without downloading
    async fn fetch_direct_url(&self, url: &str) -> Result<DirectUrlInfo>;

    /// Download the media into `dest_dir`, reporting raw progress samples
    /// through `progress`
    async fn download(
        &self,
        url: &str,
        options: &FetchOptions,
        dest_dir: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<LocalFile>;
}

/// CLI-based extractor shelling out to a yt-dlp binary
pub struct YtDlpExtractor {
    binary: PathBuf,
    cookies_file: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Discover the yt-dlp binary on PATH
    ///
    /// A `cookies.txt` in the working directory is picked up automatically,
    /// matching what users of cookie-gated platforms expect.
    pub fn discover() -> Result<Self> {
        let binary = which::which("yt-dlp")
            .map_err(|_| Error::ExternalTool("yt-dlp binary not found on PATH".to_string()))?;

        let cookies = PathBuf::from("cookies.txt");
        let cookies_file = cookies.exists().then_some(cookies);
        if let Some(ref path) = cookies_file {
            tracing::info!(path = %path.display(), "Using cookies file");
        }

        Ok(Self {
            binary,
            cookies_file,
        })
    }

    /// Use an explicit binary path instead of PATH discovery
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookies_file: None,
        }
    }

    /// Set or clear the cookies file passed to the binary
    pub fn cookies_file(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_file = path;
        self
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--no-check-certificates".to_string(),
            "--user-agent".to_string(),
            USER_AGENT.to_string(),
        ];
        if let Some(ref cookies) = self.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        args
    }

    /// Run yt-dlp in dump-json mode and parse its single-line JSON output
    async fn dump_json(&self, url: &str, extra_args: &[&str]) -> Result<serde_json::Value> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(self.base_args())
            .arg("--dump-json")
            .args(extra_args)
            .arg(url)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::ExternalTool(format!("unparseable yt-dlp JSON output: {e}")))
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn fetch_metadata(&self, url: &str) -> Result<Metadata> {
        let info = self.dump_json(url, &[]).await?;
        Ok(metadata_from_json(&info, url))
    }

    async fn fetch_direct_url(&self, url: &str) -> Result<DirectUrlInfo> {
        let info = self
            .dump_json(url, &["-f", "best[ext=mp4]/best"])
            .await?;

        let direct_url = info["url"]
            .as_str()
            .ok_or_else(|| Error::ExternalTool("no direct URL in yt-dlp output".to_string()))?
            .to_string();
        let title = info["title"].as_str().unwrap_or("video");
        let ext = info["ext"].as_str().unwrap_or("mp4");
        let filesize = info["filesize"]
            .as_u64()
            .or_else(|| info["filesize_approx"].as_u64());

        Ok(DirectUrlInfo {
            direct_url,
            filename: crate::fsutil::sanitize_filename(&format!("{title}.{ext}")),
            filesize,
            expires_in: DIRECT_URL_TTL_SECS,
        })
    }

    async fn download(
        &self,
        url: &str,
        options: &FetchOptions,
        dest_dir: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<LocalFile> {
        // yt-dlp prints the final path into a side file so the progress
        // stream on stdout stays parseable
        let token: u64 = rand::random();
        let path_file = dest_dir.join(format!(".vidfetch-{token:016x}.path"));

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(self.base_args())
            .args(["-f", &options.format])
            .args(["--retries", INNER_RETRIES])
            .args(["--fragment-retries", INNER_RETRIES])
            .args(["--newline", "--progress"])
            .args([
                "--print-to-file",
                "after_move:filepath",
                &path_file.display().to_string(),
            ])
            .args([
                "-o",
                &dest_dir.join("%(title)s.%(ext)s").display().to_string(),
            ]);
        if let Some(ref referer) = options.referer {
            cmd.args(["--add-header", &format!("Referer:{referer}")]);
        }
        if let Some(ref container) = options.merge_output_format {
            cmd.args(["--merge-output-format", container]);
        }
        cmd.arg(url)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::ExternalTool(format!("failed to spawn yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExternalTool("yt-dlp stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalTool("yt-dlp stderr not captured".to_string()))?;

        let progress_task = {
            let progress = progress.clone();
            tokio::spawn(async move {
                let mut lines = tokio::io::BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(raw) = parse_progress_line(&line) {
                        progress.report(raw).await;
                    }
                }
            })
        };

        let mut stderr_buf = String::new();
        let _ = tokio::io::AsyncReadExt::read_to_string(&mut stderr, &mut stderr_buf).await;

        let status = child
            .wait()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to wait for yt-dlp: {e}")))?;
        progress_task.await.ok();

        if !status.success() {
            tokio::fs::remove_file(&path_file).await.ok();
            return Err(classify_failure(&stderr_buf));
        }

        let written = tokio::fs::read_to_string(&path_file).await.map_err(|_| {
            Error::ExternalTool("yt-dlp did not report an output file".to_string())
        })?;
        tokio::fs::remove_file(&path_file).await.ok();

        let path = PathBuf::from(written.trim());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::ExternalTool("yt-dlp reported an invalid output path".to_string()))?
            .to_string();

        Ok(LocalFile { name, path })
    }
}

fn metadata_from_json(info: &serde_json::Value, url: &str) -> Metadata {
    Metadata {
        title: info["title"].as_str().unwrap_or("Unknown").to_string(),
        thumbnail: info["thumbnail"].as_str().unwrap_or("").to_string(),
        duration: info["duration"].as_f64().unwrap_or(0.0) as u64,
        uploader: info["uploader"].as_str().unwrap_or("Unknown").to_string(),
        url: url.to_string(),
        platform: info["extractor"].as_str().unwrap_or("Unknown").to_string(),
    }
}

/// Parse one stdout line into a raw progress sample, if it carries one
pub(crate) fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let captures = PROGRESS_LINE.captures(line)?;
    Some(RawProgress::Percent(captures[1].to_string()))
}

/// Map yt-dlp stderr onto the error taxonomy
pub(crate) fn classify_failure(stderr: &str) -> Error {
    let lower = stderr.to_lowercase();

    if lower.contains("sign in to confirm") || lower.contains("bot") {
        return Error::AuthRequired(
            "the source blocked automated access (bot detection)".to_string(),
        );
    }
    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return Error::Validation(first_line(stderr));
    }
    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("temporar")
        || lower.contains("503")
    {
        return Error::TransientNetwork(first_line(stderr));
    }
    if lower.contains("unable to rename")
        || lower.contains("unable to write")
        || lower.contains("no space left")
    {
        return Error::Storage(first_line(stderr));
    }

    Error::ExternalTool(first_line(stderr))
}

fn first_line(stderr: &str) -> String {
    stderr
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("yt-dlp failed without output")
        .trim()
        .to_string()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_lines_parse_to_percent_samples() {
        let raw = parse_progress_line("[download]  43.1% of 5.02MiB at 1.23MiB/s ETA 00:03");
        assert_eq!(raw, Some(RawProgress::Percent("43.1".to_string())));

        let raw = parse_progress_line("[download] 100% of 5.02MiB in 00:04");
        assert_eq!(raw, Some(RawProgress::Percent("100".to_string())));
    }

    #[test]
    fn non_progress_lines_are_ignored() {
        assert_eq!(parse_progress_line("[info] Writing video metadata"), None);
        assert_eq!(parse_progress_line("[download] Destination: clip.mp4"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn bot_detection_maps_to_auth_required() {
        let err = classify_failure("ERROR: Sign in to confirm you're not a bot.");
        assert!(matches!(err, Error::AuthRequired(_)));
        assert!(err.to_string().contains("cookies.txt"));
    }

    #[test]
    fn unsupported_url_maps_to_validation() {
        let err = classify_failure("ERROR: Unsupported URL: https://example.com");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn timeouts_map_to_transient_network() {
        let err = classify_failure("ERROR: Connection timed out");
        assert!(matches!(err, Error::TransientNetwork(_)));

        let err = classify_failure("ERROR: HTTP Error 503: Service Unavailable");
        assert!(matches!(err, Error::TransientNetwork(_)));
    }

    #[test]
    fn write_failures_map_to_storage() {
        let err = classify_failure("ERROR: unable to write data: No space left on device");
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn unknown_failures_map_to_external_tool_with_first_line() {
        let err = classify_failure("\nERROR: something odd\nmore context");
        match err {
            Error::ExternalTool(msg) => assert_eq!(msg, "ERROR: something odd"),
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }

    #[test]
    fn metadata_json_defaults_missing_fields() {
        let info = serde_json::json!({"title": "Clip", "duration": 12.7});
        let meta = metadata_from_json(&info, "https://example.com/v");

        assert_eq!(meta.title, "Clip");
        assert_eq!(meta.duration, 12);
        assert_eq!(meta.uploader, "Unknown");
        assert_eq!(meta.platform, "Unknown");
        assert_eq!(meta.url, "https://example.com/v");
    }
}
