//! Conversion engine backed by an external converter executable
//!
//! The executable reads FHIR-JSON on stdin and writes YAML on stdout. A
//! custom mapping is handed over as `--mapping <file>`. A non-zero exit is a
//! conversion failure carrying stderr as the error text.

use super::{ConversionEngine, ConversionResult};
use crate::config::HuffConfig;
use crate::error::HuffError;
use crate::result::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

/// Drives a converter executable per conversion
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    default_mapping: Option<PathBuf>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            default_mapping: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_default_mapping(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_mapping = Some(path.into());
        self
    }

    pub fn from_config(config: &HuffConfig) -> Self {
        let (program, args) = config.engine_command();
        let engine = Self::new(program).with_args(args);
        match config.engine_default_mapping() {
            Some(path) => engine.with_default_mapping(path),
            None => engine,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, raw: &str, mapping_file: Option<&Path>) -> ConversionResult {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(path) = mapping_file {
            command.arg("--mapping").arg(path);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ConversionResult::Failure {
                    error: format!("failed to start '{}': {}", self.program, e),
                };
            }
        };

        // Feed stdin from a separate task so a converter that streams output
        // while reading cannot fill its stdout pipe and stall both sides
        let writer = child.stdin.take().map(|mut stdin| {
            let input = raw.to_owned();
            tokio::spawn(async move { stdin.write_all(input.as_bytes()).await })
        });

        let output = child.wait_with_output().await;

        if let Some(writer) = writer {
            // The converter may exit before reading everything; its exit
            // status is what counts
            match writer.await {
                Ok(Err(e)) => trace!("Converter closed stdin early: {}", e),
                Err(e) => trace!("Stdin writer task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return ConversionResult::Failure {
                    error: format!("failed to wait for '{}': {}", self.program, e),
                };
            }
        };

        if output.status.success() {
            ConversionResult::Success {
                yaml: String::from_utf8_lossy(&output.stdout).into_owned(),
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            ConversionResult::Failure {
                error: if stderr.is_empty() {
                    format!("'{}' exited with {}", self.program, output.status)
                } else {
                    stderr
                },
            }
        }
    }
}

#[async_trait]
impl ConversionEngine for CommandEngine {
    async fn initialize(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                HuffError::engine_error(format!("cannot run converter '{}': {}", self.program, e))
            })?;

        if !status.success() {
            return Err(HuffError::engine_error(format!(
                "converter '{}' failed its version check ({})",
                self.program, status
            )));
        }

        debug!("Conversion engine '{}' ready", self.program);
        Ok(())
    }

    async fn convert(&self, raw: &str) -> String {
        self.run(raw, None).await.to_json()
    }

    async fn convert_with_mapping(&self, raw: &str, mapping: &str) -> String {
        // removed when dropped
        let mapping_file = match tempfile::Builder::new()
            .prefix("huff-mapping-")
            .suffix(".hfc")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                return ConversionResult::Failure {
                    error: format!("cannot create mapping file: {e}"),
                }
                .to_json();
            }
        };

        if let Err(e) = tokio::fs::write(mapping_file.path(), mapping).await {
            return ConversionResult::Failure {
                error: format!(
                    "cannot write mapping file '{}': {}",
                    mapping_file.path().display(),
                    e
                ),
            }
            .to_json();
        }

        self.run(raw, Some(mapping_file.path())).await.to_json()
    }

    async fn default_mapping(&self) -> Result<String> {
        let path = self.default_mapping.as_ref().ok_or_else(|| {
            HuffError::engine_error(format!(
                "no default mapping configured for '{}'",
                self.program
            ))
        })?;
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HuffError::io_error(path, e))
    }
}
