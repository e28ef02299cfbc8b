//! Append-only request and error log files.
//!
//! One line per event: timestamp, correlation id, message, tab-separated.
//! Rotation is by filename only; nothing here truncates or sweeps.

use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

const REQUEST_LOG: &str = "reqLog.log";
const ERROR_LOG: &str = "errLog.log";

#[derive(Clone)]
pub struct FileLogger {
    dir: PathBuf,
}

impl FileLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn log_request(&self, method: &str, uri: &str, origin: &str) {
        self.append(REQUEST_LOG, &format!("{method}\t{uri}\t{origin}"))
            .await;
    }

    pub async fn log_error(&self, message: &str) {
        self.append(ERROR_LOG, message).await;
    }

    /// Failures to write are logged and swallowed; the log file is an
    /// audit artifact, never a reason to fail a request.
    async fn append(&self, file_name: &str, message: &str) {
        let line = format!(
            "{}\t{}\t{}\n",
            chrono::Utc::now().to_rfc3339(),
            Uuid::new_v4(),
            message
        );

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("Failed to create log directory: {e}");
            return;
        }

        let path = self.dir.join(file_name);
        let result = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(line.as_bytes()).await
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to append to {}: {e}", path.display());
        }
    }
}
