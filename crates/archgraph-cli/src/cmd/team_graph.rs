use anyhow::Result;
use archgraph_core::render::{TeamRenderOptions, render_team_graph};
use clap::Args;

use super::Context;
use crate::output;

/// Arguments for `archgraph team-graph`.
#[derive(Args, Debug, Default)]
pub struct TeamGraphArgs {
    /// Draw one edge per team pair, labelled with the dependency count.
    #[arg(long)]
    pub summarize_relations: bool,

    /// Leave out planned applications.
    #[arg(long)]
    pub hide_planned: bool,
}

pub fn run_team_graph(args: &TeamGraphArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load()?;
    let dot = render_team_graph(
        &loaded.project,
        &TeamRenderOptions {
            summarize_relations: args.summarize_relations,
            hide_planned: args.hide_planned,
            rankdir: ctx.settings.rankdir,
        },
    );
    output::render_artifact(ctx.output, "dot", &dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: TeamGraphArgs,
    }

    #[test]
    fn team_graph_args_parse() {
        let w = Wrapper::parse_from(["test"]);
        assert!(!w.args.summarize_relations);
        assert!(!w.args.hide_planned);

        let w = Wrapper::parse_from(["test", "--summarize-relations", "--hide-planned"]);
        assert!(w.args.summarize_relations);
        assert!(w.args.hide_planned);
    }
}
