use std::io::Write;

use anyhow::Result;
use archgraph_core::Violation;
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output;

/// Arguments for `archgraph validate`.
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub valid: bool,
    pub project: String,
    pub applications: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subview: Option<String>,
    pub warnings: Vec<WarningOutput>,
}

#[derive(Debug, Serialize)]
pub struct WarningOutput {
    pub code: String,
    pub entity: String,
    pub message: String,
}

impl From<&Violation> for WarningOutput {
    fn from(violation: &Violation) -> Self {
        Self {
            code: violation.error_code().to_string(),
            entity: violation.entity().to_string(),
            message: violation.to_string(),
        }
    }
}

pub fn run_validate(_args: &ValidateArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let report = ValidateOutput {
        valid: true,
        project: loaded.project.name.clone(),
        applications: loaded.project.applications().len(),
        subview: loaded.subview,
        warnings: loaded.warnings.iter().map(WarningOutput::from).collect(),
    };
    output::render_mode(ctx.output, &report, render_validate_text, render_validate_human)
}

fn render_validate_text(report: &ValidateOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "valid")?;
    for warning in &report.warnings {
        writeln!(w, "warning[{}]: {}", warning.code, warning.message)?;
    }
    Ok(())
}

fn render_validate_human(report: &ValidateOutput, w: &mut dyn Write) -> std::io::Result<()> {
    output::pretty_section(w, &format!("{} is valid", report.project))?;
    output::pretty_kv(w, "Apps", report.applications.to_string())?;
    if let Some(subview) = &report.subview {
        output::pretty_kv(w, "Subview", subview)?;
    }
    if !report.warnings.is_empty() {
        writeln!(w)?;
        output::pretty_section(w, &format!("Warnings ({})", report.warnings.len()))?;
        for warning in &report.warnings {
            writeln!(w, "  [{}] {}", warning.code, warning.message)?;
        }
    }
    Ok(())
}
