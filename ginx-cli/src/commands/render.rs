//! `ginx render`: render one template to stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use ginx_html::minijinja::Value;

use super::EngineArgs;

/// Arguments for `ginx render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Canonical template name, e.g. `sub/page`.
    pub name: String,

    /// Render data; YAML for `.yaml`/`.yml`, JSON otherwise.
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let data = match &self.data {
            Some(path) => read_data(path)?,
            None => Value::from(std::collections::BTreeMap::<String, Value>::new()),
        };
        let engine = self.engine.load()?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        engine
            .render(&mut out, &self.name, data)
            .with_context(|| format!("failed to render {:?}", self.name))?;
        out.flush().context("failed to flush stdout")?;
        Ok(())
    }
}

fn read_data(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let value = if is_yaml {
        let parsed: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        Value::from_serialize(&parsed)
    } else {
        let parsed: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        Value::from_serialize(&parsed)
    };
    Ok(value)
}
