// src/reports/render/mod.rs
//! Turning a projected [`ReportDocument`] into PDF bytes.

pub mod command;
pub mod html;
pub mod pdf;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::{RendererKind, ReportsConfig};
use super::ReportDocument;

pub use command::CommandRenderer;
pub use pdf::BuiltinPdfRenderer;

#[derive(Debug)]
pub enum RenderError {
    /// A configured image could not be read.
    MissingAsset(String),
    Engine(String),
    /// The renderer did not finish within the configured number of seconds.
    Timeout(u64),
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::MissingAsset(path) => write!(f, "Report asset not found: {}", path),
            RenderError::Engine(msg) => write!(f, "PDF engine failed: {}", msg),
            RenderError::Timeout(secs) => write!(f, "PDF rendering timed out after {}s", secs),
            RenderError::Io(err) => write!(f, "PDF rendering I/O error: {}", err),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

#[async_trait]
pub trait ReportRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produces the complete PDF or fails; partial output is never returned.
    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError>;
}

pub fn build_renderer(config: &ReportsConfig) -> Result<Arc<dyn ReportRenderer>> {
    let renderer: Arc<dyn ReportRenderer> = match config.renderer {
        RendererKind::Builtin => Arc::new(BuiltinPdfRenderer::new()),
        RendererKind::Command => {
            let program = config
                .command
                .clone()
                .ok_or_else(|| anyhow!("reports.command is required for the command renderer"))?;
            Arc::new(CommandRenderer::new(program, config))
        }
    };

    log::info!("Report renderer: {}", renderer.name());
    Ok(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_renderer_by_kind() {
        let config = ReportsConfig::default();
        assert_eq!(build_renderer(&config).unwrap().name(), "builtin");

        let mut config = ReportsConfig::default();
        config.renderer = RendererKind::Command;
        assert!(build_renderer(&config).is_err());

        config.command = Some("wkhtmltopdf".to_string());
        assert_eq!(build_renderer(&config).unwrap().name(), "command");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(RenderError::Timeout(30).to_string(), "PDF rendering timed out after 30s");
        assert_eq!(
            RenderError::MissingAsset("/srv/logo.png".to_string()).to_string(),
            "Report asset not found: /srv/logo.png"
        );
    }
}
