use std::fmt;
use std::path::{Path, PathBuf};

use spdlog::{error, info};
use tokio::fs;

use crate::error::{OutputWriteError, SerializationError};
use crate::feed_model::{JSON_FILE_NAME, RSS_FILE_NAME};

/// Serialized document, or the reason it could not be produced.
pub type Payload = Result<Vec<u8>, SerializationError>;

pub type WriteOutcome = Result<PathBuf, OutputWriteError>;

#[derive(Debug)]
pub struct WriteReport {
    pub rss: WriteOutcome,
    pub json: WriteOutcome,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.rss.is_ok() && self.json.is_ok()
    }

    pub fn written(&self) -> Vec<&Path> {
        [&self.rss, &self.json]
            .into_iter()
            .filter_map(|outcome| outcome.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }
}

impl fmt::Display for WriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn describe(outcome: &WriteOutcome) -> String {
            match outcome {
                Ok(path) => format!("written to {}", path.display()),
                Err(e) => format!("failed ({})", e),
            }
        }
        write!(f, "rss2 {}; json {}", describe(&self.rss), describe(&self.json))
    }
}

/// Creates `dest_dir`, then writes both payloads concurrently. One failing
/// never stops the other. Only a failure to create the directory is
/// returned as an error.
pub async fn write(dest_dir: &Path, rss: Payload, json: Payload) -> Result<WriteReport, OutputWriteError> {
    if let Err(source) = fs::create_dir_all(dest_dir).await {
        return Err(OutputWriteError::CreateDir { path: dest_dir.to_path_buf(), source });
    }

    let rss_path = dest_dir.join(RSS_FILE_NAME);
    let json_path = dest_dir.join(JSON_FILE_NAME);
    let (rss, json) = tokio::join!(
        write_payload(rss_path, rss),
        write_payload(json_path, json),
    );

    Ok(WriteReport { rss, json })
}

async fn write_payload(path: PathBuf, payload: Payload) -> WriteOutcome {
    let bytes = match payload {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Not writing {}: {}", path.display(), e);
            return Err(OutputWriteError::MissingPayload { path, reason: e.to_string() });
        }
    };

    match replace_file(&path, &bytes).await {
        Ok(()) => {
            info!("Successfully wrote {}", path.display());
            Ok(path)
        }
        Err(source) => {
            error!("Error writing {}: {}", path.display(), source);
            Err(OutputWriteError::Write { path, source })
        }
    }
}

// Written next to the target and renamed over it, so readers never see a
// half written feed.
async fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, bytes).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}
