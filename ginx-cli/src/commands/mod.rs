pub mod check;
pub mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ginx_html::{Engine, EngineBuilder, EngineConfig};

/// Engine options shared by every subcommand.
#[derive(Args, Debug)]
pub struct EngineArgs {
    /// Template root directory (or a single template file).
    pub root: PathBuf,

    /// YAML engine configuration (extensions, delimiters, escaping).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Template extension to recognise; repeat for several. Overrides the config.
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,
}

impl EngineArgs {
    /// Build an engine from the flags and load `root` into it.
    pub fn load(&self) -> Result<Engine> {
        let config = match &self.config {
            Some(path) => {
                tracing::debug!("reading engine config from {}", path.display());
                EngineConfig::load(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        let mut builder = EngineBuilder::from_config(config);
        if !self.extensions.is_empty() {
            builder = builder.extensions(self.extensions.iter().cloned());
        }
        let mut engine = builder.build().context("invalid engine configuration")?;

        engine.load(&self.root).with_context(|| {
            format!("failed to load templates from {}", self.root.display())
        })?;
        Ok(engine)
    }
}
