use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use archgraph_core::load_definitions;
use clap::Args;
use tracing::info;

use super::Context;
use crate::web::{self, AppState, Frontend, StaticDocuments};

/// Arguments for `archgraph serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Serve front-end files from this folder instead of the built-in page.
    #[arg(long, value_name = "DIR")]
    pub local_template_folder: Option<PathBuf>,

    /// Folder whose files are listed in `/data` and served under `/documents/`.
    #[arg(long, value_name = "DIR")]
    pub static_documents_folder: Option<PathBuf>,
}

impl ServeArgs {
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Build the shared request state. Only the raw definition is read here;
/// validation runs per request.
pub fn app_state(args: &ServeArgs, ctx: &Context) -> Result<AppState> {
    let definition = load_definitions(&ctx.config)?;
    let documents = args
        .static_documents_folder
        .as_ref()
        .map(StaticDocuments::open)
        .transpose()?;
    let frontend = match &args.local_template_folder {
        Some(dir) => {
            info!(folder = %dir.display(), "serving front end from local folder");
            Frontend::folder(dir)?
        }
        None => Frontend::Embedded,
    };
    Ok(AppState {
        definition,
        loader: ctx.loader(),
        grouping_key: ctx.settings.grouping_key,
        documents,
        frontend,
    })
}

pub fn run_serve(args: &ServeArgs, ctx: &Context) -> Result<()> {
    let state = Arc::new(app_state(args, ctx)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(state, args.addr()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ServeArgs,
    }

    #[test]
    fn serve_defaults() {
        let w = Wrapper::parse_from(["test"]);
        assert_eq!(w.args.addr(), "127.0.0.1:8080".parse().unwrap());
        assert!(w.args.local_template_folder.is_none());
        assert!(w.args.static_documents_folder.is_none());
    }

    #[test]
    fn serve_args_parse() {
        let w = Wrapper::parse_from([
            "test",
            "--port",
            "9000",
            "--host",
            "0.0.0.0",
            "--local-template-folder",
            "ui",
            "--static-documents-folder",
            "docs",
        ]);
        assert_eq!(w.args.addr(), "0.0.0.0:9000".parse().unwrap());
        assert_eq!(w.args.local_template_folder, Some(PathBuf::from("ui")));
        assert_eq!(w.args.static_documents_folder, Some(PathBuf::from("docs")));
    }
}
