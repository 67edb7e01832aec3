use std::path::PathBuf;

use clap::Parser;

use crate::server::DEFAULT_BIND;

#[derive(Debug, Parser)]
#[command(name = "server")]
#[command(about = "Database-backed HTTP service")]
pub struct Args {
    /// Path to the JSON database config file
    #[arg(long, env = "SERVER_CONFIG")]
    pub config: PathBuf,

    /// Address the HTTP listener binds to
    #[arg(long, env = "SERVER_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,
}
