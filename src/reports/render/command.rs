// src/reports/render/command.rs
//! External HTML-to-PDF converter (wkhtmltopdf, chromium --print-to-pdf, ...) run as a subprocess.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::html::{to_html, Assets};
use super::{RenderError, ReportRenderer};
use crate::config::ReportsConfig;
use crate::reports::ReportDocument;

pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    config: ReportsConfig,
}

impl CommandRenderer {
    pub fn new(program: String, config: &ReportsConfig) -> Self {
        Self {
            program,
            args: config.command_args.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            config: config.clone(),
        }
    }

    /// Arguments with `{input}` and `{output}` replaced by the temp file paths.
    fn resolved_args(&self, input: &str, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", input).replace("{output}", output))
            .collect()
    }
}

#[async_trait]
impl ReportRenderer for CommandRenderer {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
        let assets = Assets::load(&self.config)?;
        let html = to_html(document, &assets);

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("report.html");
        let output = workdir.path().join("report.pdf");
        tokio::fs::write(&input, html).await?;

        let args = self.resolved_args(&input.to_string_lossy(), &output.to_string_lossy());
        log::debug!("Running report renderer: {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command.args(&args).kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout.as_secs()))??;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RenderError::Engine(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| RenderError::Engine(format!("{} produced no output: {}", self.program, e)))?;
        if bytes.is_empty() {
            return Err(RenderError::Engine(format!("{} produced an empty document", self.program)));
        }

        Ok(bytes)
    }
}
