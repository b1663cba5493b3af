#![forbid(unsafe_code)]

mod cmd;
mod output;
mod web;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use archgraph_core::ValidationMode;
use archgraph_core::settings::{Settings, load_settings};
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "archgraph: describe, lint and draw distributed architectures",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Architecture definition file. Repeat to merge extra fragments.
    #[arg(
        short,
        long,
        global = true,
        value_name = "PATH",
        default_value = "archgraph.yml"
    )]
    config: Vec<PathBuf>,

    /// Restrict the project to a declared subview.
    #[arg(long, global = true, value_name = "NAME")]
    subview: Option<String>,

    /// Report integrity violations as warnings instead of failing.
    #[arg(long, global = true)]
    skip_validation: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn validation_mode(&self) -> ValidationMode {
        if self.skip_validation {
            ValidationMode::Lenient
        } else {
            ValidationMode::Strict
        }
    }

    /// Settings next to the main definition file, merged with user settings.
    fn settings(&self) -> archgraph_core::Result<Settings> {
        match (&self.command, self.config.first()) {
            (Commands::Completions(_), _) | (_, None) => Ok(Settings::default()),
            (_, Some(main)) => load_settings(main),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lint",
        about = "Validate the architecture definition",
        long_about = "Load the definition, check referential integrity, and print `valid`.\n\nWith --skip-validation, violations are printed as warnings instead of failing.",
        after_help = "EXAMPLES:\n    # Validate the default definition\n    archgraph validate\n\n    # Validate a subview of a multi-file definition\n    archgraph -c main.yml -c extra.yml --subview payments validate\n\n    # Emit machine-readable output\n    archgraph validate --json"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        next_help_heading = "Lint",
        about = "List applications",
        long_about = "List every application of the (filtered) project in declaration order.",
        after_help = "EXAMPLES:\n    # List applications\n    archgraph list\n\n    # Emit a JSON array\n    archgraph list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Lint",
        about = "Report dependency cycles",
        long_about = "Detect closed loops of dependencies between applications.",
        after_help = "EXAMPLES:\n    # Print cycles\n    archgraph analyze\n\n    # Fail a CI job when a cycle exists\n    archgraph analyze --fail-on-cycles"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Render",
        about = "Write HTML documentation",
        long_about = "Render the project overview as a single HTML page on stdout.",
        after_help = "EXAMPLES:\n    # Default template\n    archgraph documentation > architecture.html\n\n    # Custom template and icons\n    archgraph documentation --template-path doc.html --icon-path icons/"
    )]
    Documentation(cmd::documentation::DocumentationArgs),

    #[command(
        next_help_heading = "Render",
        about = "Write the application graph as DOT",
        long_about = "Render applications and their dependencies in Graphviz DOT.\n\nWith --application, only that application and its direct neighbours are drawn.",
        after_help = "EXAMPLES:\n    # Whole system\n    archgraph graph | dot -Tsvg > system.svg\n\n    # One application's neighbourhood, without planned ones\n    archgraph graph --application checkout --hide-planned"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Render",
        about = "Write the team relation graph as DOT",
        long_about = "Render relations between teams derived from cross-team dependencies.",
        after_help = "EXAMPLES:\n    # One edge per dependency\n    archgraph team-graph\n\n    # One edge per team pair\n    archgraph team-graph --summarize-relations"
    )]
    TeamGraph(cmd::team_graph::TeamGraphArgs),

    #[command(
        next_help_heading = "Serve",
        about = "Serve the interactive viewer",
        long_about = "Serve project data as JSON under /data and the viewer page on every other path.",
        after_help = "EXAMPLES:\n    # Serve on localhost:8080\n    archgraph serve\n\n    # Custom port with static documents\n    archgraph serve --port 9000 --static-documents-folder docs/"
    )]
    Serve(cmd::serve::ServeArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    archgraph completions bash\n\n    # Generate zsh completions\n    archgraph completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ARCHGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "archgraph=debug,info"
        } else {
            "archgraph=info,warn"
        })
    });

    let format = env::var("ARCHGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(command: &Commands, ctx: &cmd::Context) -> anyhow::Result<()> {
    match command {
        Commands::Validate(args) => cmd::validate::run_validate(args, ctx),
        Commands::List(args) => cmd::list::run_list(args, ctx),
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, ctx),
        Commands::Documentation(args) => cmd::documentation::run_documentation(args, ctx),
        Commands::Graph(args) => cmd::graph::run_graph(args, ctx),
        Commands::TeamGraph(args) => cmd::team_graph::run_team_graph(args, ctx),
        Commands::Serve(args) => cmd::serve::run_serve(args, ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(config = ?cli.config, subview = ?cli.subview, "starting");

    let settings = cli.settings();
    let configured = settings.as_ref().ok().and_then(|s| s.output.as_deref());
    let mode = output::resolve_output_mode(cli.format, cli.json, configured);

    let result = settings.map_err(anyhow::Error::from).and_then(|settings| {
        let ctx = cmd::Context {
            config: cli.config.clone(),
            subview: cli.subview.clone(),
            validation: cli.validation_mode(),
            output: mode,
            settings,
        };
        run(&cli.command, &ctx)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            if let Err(render_err) = output::render_error(mode, &CliError::from_anyhow(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_defaults_and_repeats() {
        let cli = Cli::parse_from(["archgraph", "list"]);
        assert_eq!(cli.config, vec![PathBuf::from("archgraph.yml")]);

        let cli = Cli::parse_from(["archgraph", "-c", "a.yml", "--config", "b.yml", "list"]);
        assert_eq!(
            cli.config,
            vec![PathBuf::from("a.yml"), PathBuf::from("b.yml")]
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "archgraph",
            "graph",
            "--subview",
            "payments",
            "--skip-validation",
            "--format",
            "json",
        ]);
        assert_eq!(cli.subview.as_deref(), Some("payments"));
        assert_eq!(cli.validation_mode(), ValidationMode::Lenient);
        assert_eq!(cli.format, Some(OutputMode::Json));
    }

    #[test]
    fn strict_by_default() {
        let cli = Cli::parse_from(["archgraph", "validate"]);
        assert_eq!(cli.validation_mode(), ValidationMode::Strict);
        assert!(!cli.json);
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["archgraph", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn completions_skip_settings() {
        let cli = Cli::parse_from([
            "archgraph",
            "-c",
            "/nonexistent/dir/main.yml",
            "completions",
            "zsh",
        ]);
        assert_eq!(cli.settings().unwrap(), Settings::default());
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["archgraph", "validate"],
            vec!["archgraph", "list"],
            vec!["archgraph", "analyze", "--fail-on-cycles"],
            vec!["archgraph", "documentation", "--template-path", "t.html"],
            vec!["archgraph", "graph", "--application", "cart"],
            vec!["archgraph", "team-graph", "--summarize-relations"],
            vec!["archgraph", "serve", "--port", "9000"],
            vec!["archgraph", "completions", "fish"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "Failed to parse: {:?} ({:?})",
                args,
                result.err()
            );
        }
    }
}
