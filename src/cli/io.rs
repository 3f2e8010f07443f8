use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::domain::{PhotoUpload, ValidationError};

use super::error::CliError;

pub async fn read_value(val: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    read_opt_value(val, file)
        .await?
        .ok_or_else(|| CliError::InvalidInput("value required".into()))
}

/// File contents win over the inline value.
pub async fn read_opt_value(
    val: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<String>, CliError> {
    if let Some(path) = file {
        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| input_file_error(&path, source))?;
        return Ok(Some(data));
    }
    Ok(val)
}

/// Files over `max_bytes` are rejected from their metadata, before reading.
pub async fn read_photo(path: &Path, max_bytes: u64) -> Result<PhotoUpload, CliError> {
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|source| input_file_error(path, source))?
        .len();
    if size > max_bytes {
        return Err(ValidationError::PhotoTooLarge {
            size,
            limit: max_bytes,
        }
        .into());
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| input_file_error(path, source))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("photo")
        .to_string();
    Ok(PhotoUpload::new(file_name, bytes))
}

/// First line of `reader` without its line terminator.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, CliError> {
    let mut line = String::new();
    reader.read_line(&mut line).await.map_err(CliError::Stdin)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn input_file_error(path: &Path, source: std::io::Error) -> CliError {
    CliError::InputFile {
        path: path.display().to_string(),
        source,
    }
}
