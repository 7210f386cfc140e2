//! `ginx check`: load a tree and list what it registers.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::EngineArgs;

/// Arguments for `ginx check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    root: String,
    templates: Vec<&'a str>,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let engine = self.engine.load()?;

        if self.json {
            let report = CheckReport {
                root: self.engine.root.display().to_string(),
                templates: engine.template_names().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        for name in engine.template_names() {
            println!("{} {name}", "✓".green());
        }
        println!(
            "{} {} template(s) in {}",
            "ok".bold(),
            engine.len(),
            self.engine.root.display()
        );
        Ok(())
    }
}
