//! Metadata store adapter backed by the `exiftool` command-line tool
//!
//! The tool is always invoked with a structured argument vector, never
//! through a shell, so tag values cross the process boundary literally and
//! no quoting or escaping is needed. Reads go through `-json` output and
//! are parsed with serde; a write replaces an attribute's values wholesale,
//! which keeps every attribute update all-or-nothing.

use async_trait::async_trait;
use image_tagger_common::{Attribute, StoreError};
use image_tagger_core::services::MetadataStore;
use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Default executable name, resolved through PATH.
pub const DEFAULT_EXECUTABLE: &str = "exiftool";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from running the tool or reading its output
#[derive(Debug, Error)]
pub enum ExifToolError {
    #[error("failed to launch {executable}: {source}")]
    Launch {
        executable: String,
        source: std::io::Error,
    },

    #[error("exiftool exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("exiftool timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to parse exiftool output: {0}")]
    Parse(String),
}

impl From<ExifToolError> for StoreError {
    fn from(err: ExifToolError) -> Self {
        StoreError(err.to_string())
    }
}

/// Adapter over an `exiftool` executable.
pub struct ExifTool {
    executable: String,
    timeout: Duration,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ExifTool {
    pub fn new() -> Self {
        Self::with_executable(DEFAULT_EXECUTABLE)
    }

    pub fn with_executable(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound the wall-clock time of a single tool invocation. A run that
    /// exceeds it is killed and surfaces as a store failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tool version string; doubles as the startup reachability probe.
    pub async fn version(&self) -> Result<String, ExifToolError> {
        let output = self.run([OsString::from("-ver")]).await?;
        Ok(output.trim().to_string())
    }

    /// Names of every metadata attribute present on the file.
    pub async fn list_attributes(&self, path: &Path) -> Result<Vec<String>, ExifToolError> {
        let output = self
            .run([OsString::from("-json"), path.as_os_str().to_os_string()])
            .await?;
        let documents = parse_documents(&output)?;
        let first = documents
            .into_iter()
            .next()
            .ok_or_else(|| ExifToolError::Parse("empty result document".to_string()))?;
        Ok(first.keys().cloned().collect())
    }

    /// Current values of one attribute. An absent attribute reads back as
    /// an empty vec; a scalar value normalizes to a one-element vec.
    pub async fn read_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
    ) -> Result<Vec<String>, ExifToolError> {
        let output = self
            .run([
                OsString::from("-json"),
                OsString::from(format!("-{}", attribute.tool_name())),
                path.as_os_str().to_os_string(),
            ])
            .await?;
        parse_attribute_values(&output, attribute.tool_name())
    }

    /// Replace the attribute's stored values with exactly `values`, in
    /// order. An empty `values` leaves the file untouched.
    pub async fn write_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
        values: &[String],
    ) -> Result<(), ExifToolError> {
        if values.is_empty() {
            debug!("nothing to write for {attribute}");
            return Ok(());
        }
        self.run(replace_args(attribute, values, path)).await?;
        Ok(())
    }

    /// Append a single value to a list attribute.
    pub async fn add_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), ExifToolError> {
        self.run(edit_args(attribute, "+=", value, path)).await?;
        Ok(())
    }

    /// Remove a single value from a list attribute.
    pub async fn remove_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), ExifToolError> {
        self.run(edit_args(attribute, "-=", value, path)).await?;
        Ok(())
    }

    async fn run<I>(&self, args: I) -> Result<String, ExifToolError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut command = Command::new(&self.executable);
        command.args(args).kill_on_drop(true);

        debug!("running {:?}", command.as_std());

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ExifToolError::Timeout(self.timeout))?
            .map_err(|source| ExifToolError::Launch {
                executable: self.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExifToolError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MetadataStore for ExifTool {
    async fn get_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self.read_attribute(path, attribute).await?)
    }

    async fn replace_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
        values: &[String],
    ) -> Result<(), StoreError> {
        Ok(self.write_attribute(path, attribute, values).await?)
    }
}

/// Argument vector for a full-replacement write. Each value becomes its own
/// `-Attr=value` argument, so the tool receives the literal tag text no
/// matter what characters it contains.
fn replace_args(attribute: Attribute, values: &[String], path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![OsString::from("-overwrite_original")];
    for value in values {
        args.push(OsString::from(format!(
            "-{}={}",
            attribute.tool_name(),
            value
        )));
    }
    args.push(path.as_os_str().to_os_string());
    args
}

fn edit_args(attribute: Attribute, operator: &str, value: &str, path: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-overwrite_original"),
        OsString::from(format!("-{}{}{}", attribute.tool_name(), operator, value)),
        path.as_os_str().to_os_string(),
    ]
}

fn parse_documents(output: &str) -> Result<Vec<serde_json::Map<String, Value>>, ExifToolError> {
    serde_json::from_str(output).map_err(|e| ExifToolError::Parse(e.to_string()))
}

/// Pull one attribute's values out of a `-json` result document.
fn parse_attribute_values(output: &str, name: &str) -> Result<Vec<String>, ExifToolError> {
    let documents = parse_documents(output)?;
    let first = documents
        .into_iter()
        .next()
        .ok_or_else(|| ExifToolError::Parse("empty result document".to_string()))?;

    let Some(value) = first.get(name) else {
        return Ok(Vec::new());
    };

    Ok(match value {
        Value::Array(items) => items.iter().map(scalar_to_string).collect(),
        other => vec![scalar_to_string(other)],
    })
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_list_attribute() {
        let output = r#"[{"SourceFile": "a.jpg", "Keywords": ["cat", "dog"]}]"#;
        assert_eq!(
            parse_attribute_values(output, "Keywords").unwrap(),
            vec!["cat", "dog"]
        );
    }

    #[test]
    fn test_parse_scalar_normalizes_to_one_value() {
        let output = r#"[{"SourceFile": "a.jpg", "Keywords": "cat"}]"#;
        assert_eq!(
            parse_attribute_values(output, "Keywords").unwrap(),
            vec!["cat"]
        );
    }

    #[test]
    fn test_parse_numeric_values() {
        // exiftool reports purely numeric keywords as JSON numbers.
        let output = r#"[{"SourceFile": "a.jpg", "Keywords": ["cat", 2024]}]"#;
        assert_eq!(
            parse_attribute_values(output, "Keywords").unwrap(),
            vec!["cat", "2024"]
        );
    }

    #[test]
    fn test_absent_attribute_is_empty_not_failed() {
        let output = r#"[{"SourceFile": "a.jpg"}]"#;
        assert!(parse_attribute_values(output, "Keywords")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_garbage_output_is_a_parse_error() {
        let err = parse_attribute_values("File not found", "Keywords").unwrap_err();
        assert!(matches!(err, ExifToolError::Parse(_)));
    }

    #[test]
    fn test_replace_args_keep_values_literal() {
        // No shell is involved, so metacharacters stay part of the value.
        let values = vec!["l'été".to_string(), "a; rm -rf $(HOME)".to_string()];
        let path = PathBuf::from("photo with spaces.jpg");
        let args = replace_args(Attribute::Keywords, &values, &path);

        assert_eq!(args[0], OsString::from("-overwrite_original"));
        assert_eq!(args[1], OsString::from("-Keywords=l'été"));
        assert_eq!(args[2], OsString::from("-Keywords=a; rm -rf $(HOME)"));
        assert_eq!(args[3], OsString::from("photo with spaces.jpg"));
    }

    #[test]
    fn test_edit_args_use_incremental_operators() {
        let path = PathBuf::from("a.jpg");
        let add = edit_args(Attribute::Subject, "+=", "cat", &path);
        assert_eq!(add[1], OsString::from("-Subject+=cat"));

        let remove = edit_args(Attribute::Subject, "-=", "cat", &path);
        assert_eq!(remove[1], OsString::from("-Subject-=cat"));
    }

    #[tokio::test]
    async fn test_missing_executable_is_a_launch_error() {
        let tool = ExifTool::with_executable("definitely-not-exiftool-7f3a");
        let err = tool.version().await.unwrap_err();
        assert!(matches!(err, ExifToolError::Launch { .. }));
    }
}
