use std::io::Write;

use anyhow::{Result, bail};
use archgraph_core::graph::{Cycle, DependencyGraph, find_cycles_in};
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output;

/// Arguments for `archgraph analyze`.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Exit non-zero when at least one dependency cycle exists.
    #[arg(long)]
    pub fail_on_cycles: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub project: String,
    pub applications: usize,
    pub dependencies: usize,
    /// Dependency targets that are not declared (lenient mode only).
    pub undeclared: Vec<String>,
    pub cycles: Vec<CycleOutput>,
}

#[derive(Debug, Serialize)]
pub struct CycleOutput {
    pub members: Vec<String>,
    pub length: usize,
    pub path: String,
}

impl From<&Cycle> for CycleOutput {
    fn from(cycle: &Cycle) -> Self {
        Self {
            members: cycle.members.clone(),
            length: cycle.len(),
            path: cycle.to_string(),
        }
    }
}

pub fn run_analyze(args: &AnalyzeArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let graph = DependencyGraph::from_project(&loaded.project);
    let cycles = find_cycles_in(&graph);

    let report = AnalyzeOutput {
        project: loaded.project.name.clone(),
        applications: graph.application_count(),
        dependencies: graph.edge_count(),
        undeclared: graph.ghost_ids().into_iter().map(str::to_string).collect(),
        cycles: cycles.iter().map(CycleOutput::from).collect(),
    };
    output::render_mode(ctx.output, &report, render_analyze_text, render_analyze_human)?;

    if args.fail_on_cycles && !cycles.is_empty() {
        bail!(
            "{} dependency cycle{} found",
            cycles.len(),
            if cycles.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

fn render_analyze_text(report: &AnalyzeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if report.cycles.is_empty() {
        writeln!(w, "no dependency cycles")?;
    }
    for cycle in &report.cycles {
        writeln!(w, "cycle: {}", cycle.path)?;
    }
    for id in &report.undeclared {
        writeln!(w, "undeclared: {id}")?;
    }
    Ok(())
}

fn render_analyze_human(report: &AnalyzeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    output::pretty_section(w, &report.project)?;
    output::pretty_kv(w, "Apps", report.applications.to_string())?;
    output::pretty_kv(w, "Deps", report.dependencies.to_string())?;
    output::pretty_kv(w, "Cycles", report.cycles.len().to_string())?;
    if !report.cycles.is_empty() {
        writeln!(w)?;
        output::pretty_section(w, "Dependency cycles")?;
        for (i, cycle) in report.cycles.iter().enumerate() {
            writeln!(w, "  {:>2}. {}", i + 1, cycle.path)?;
        }
    }
    if !report.undeclared.is_empty() {
        writeln!(w)?;
        output::pretty_section(w, "Undeclared targets")?;
        for id in &report.undeclared {
            writeln!(w, "  {id}")?;
        }
    }
    Ok(())
}
