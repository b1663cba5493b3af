use std::path::{Path, PathBuf};

use anyhow::Result;
use archgraph_core::docs::{DocumentationOptions, render_documentation};
use archgraph_core::render::{IconDirectory, IconLookup, NoIcons};
use clap::Args;

use super::Context;
use crate::output;

/// Arguments for `archgraph documentation`.
#[derive(Args, Debug, Default)]
pub struct DocumentationArgs {
    /// HTML template with `{{title}}` and `{{content}}` placeholders.
    #[arg(long, value_name = "FILE")]
    pub template_path: Option<PathBuf>,

    /// Folder of `<technology>.png` icons.
    #[arg(long, value_name = "DIR")]
    pub icon_path: Option<PathBuf>,
}

/// Icon lookup for an optional `--icon-path`.
pub fn icon_lookup(icon_path: Option<&Path>) -> Box<dyn IconLookup> {
    match icon_path {
        Some(dir) => Box::new(IconDirectory::new(dir)),
        None => Box::new(NoIcons),
    }
}

pub fn run_documentation(args: &DocumentationArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let icons = icon_lookup(args.icon_path.as_deref());
    let html = render_documentation(
        &loaded.project,
        &DocumentationOptions {
            template_path: args.template_path.as_deref(),
            icons: icons.as_ref(),
            grouping_key: ctx.settings.grouping_key,
        },
    )?;
    output::render_artifact(ctx.output, "html", &html)
}
