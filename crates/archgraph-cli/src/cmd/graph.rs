use std::path::PathBuf;

use anyhow::Result;
use archgraph_core::ArchError;
use archgraph_core::render::{RenderOptions, render_graph};
use clap::Args;

use super::Context;
use super::documentation::icon_lookup;
use crate::output;

/// Arguments for `archgraph graph`.
#[derive(Args, Debug, Default)]
pub struct GraphArgs {
    /// Only draw this application and its direct neighbours.
    #[arg(long, value_name = "ID")]
    pub application: Option<String>,

    /// Folder of `<technology>.png` icons used as node images.
    #[arg(long, value_name = "DIR")]
    pub icon_path: Option<PathBuf>,

    /// Leave out planned applications and their edges.
    #[arg(long)]
    pub hide_planned: bool,
}

impl GraphArgs {
    fn render_options(&self, ctx: &Context) -> RenderOptions {
        RenderOptions {
            application: self.application.clone(),
            hide_planned: self.hide_planned,
            ..RenderOptions::from_settings(&ctx.settings)
        }
    }
}

pub fn run_graph(args: &GraphArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let icons = icon_lookup(args.icon_path.as_deref());
    let dot = render_graph(&loaded.project, &args.render_options(ctx), icons.as_ref())
        .map_err(ArchError::from)?;
    output::render_artifact(ctx.output, "dot", &dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputMode;
    use archgraph_core::ValidationMode;
    use archgraph_core::settings::{RankDir, Settings};
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: GraphArgs,
    }

    #[test]
    fn graph_args_parse() {
        let w = Wrapper::parse_from(["test", "--application", "cart", "--hide-planned"]);
        assert_eq!(w.args.application.as_deref(), Some("cart"));
        assert!(w.args.hide_planned);
        assert!(w.args.icon_path.is_none());
    }

    #[test]
    fn options_take_layout_from_settings() {
        let ctx = Context {
            config: vec![],
            subview: None,
            validation: ValidationMode::Strict,
            output: OutputMode::Text,
            settings: Settings {
                rankdir: RankDir::Tb,
                cluster_groups: false,
                ..Settings::default()
            },
        };
        let args = Wrapper::parse_from(["test", "--application", "cart"]).args;
        let options = args.render_options(&ctx);
        assert_eq!(options.rankdir, RankDir::Tb);
        assert!(!options.cluster_groups);
        assert_eq!(options.application.as_deref(), Some("cart"));
        assert!(!options.hide_planned);
    }
}
