use std::io::Write;

use anyhow::Result;
use archgraph_core::Application;
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output;

/// Arguments for `archgraph list`.
#[derive(Args, Debug, Default)]
pub struct ListArgs {}

#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub name: String,
    pub id: String,
}

impl From<&Application> for ListEntry {
    fn from(app: &Application) -> Self {
        Self {
            name: app.name.clone(),
            id: app.id.clone(),
        }
    }
}

pub fn run_list(_args: &ListArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let entries: Vec<ListEntry> = loaded
        .project
        .applications()
        .iter()
        .map(ListEntry::from)
        .collect();
    output::render(ctx.output, &entries, |entries, w| {
        render_list_human(entries, w)
    })
}

fn render_list_human(entries: &[ListEntry], w: &mut dyn Write) -> std::io::Result<()> {
    for entry in entries {
        writeln!(w, "Name: {} Id: {}", entry.name, entry.id)?;
    }
    Ok(())
}
