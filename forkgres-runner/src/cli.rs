use clap::{Args as ClapArgs, Parser, Subcommand};

/// Forkgres - short-lived forks of managed PostgreSQL services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Fork a service and wait until the fork is ready
    Fork(ForkArgs),

    /// Delete the fork recorded by an earlier `fork --cleanup`
    Cleanup,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ForkArgs {
    /// Project containing the parent service
    #[arg(long, env = "FORKGRES_PROJECT_ID")]
    pub project_id: String,

    /// Parent service to fork
    #[arg(long, env = "FORKGRES_SERVICE_ID")]
    pub service_id: String,

    /// API key as PUBLIC_KEY:SECRET_KEY
    #[arg(long, env = "FORKGRES_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Fork strategy: now, last-snapshot or timestamp
    #[arg(long, env = "FORKGRES_STRATEGY", default_value = "now")]
    pub strategy: String,

    /// Recovery target for the timestamp strategy (e.g. 2024-05-01T12:00:00Z)
    #[arg(long, env = "FORKGRES_TARGET_TIME")]
    pub target_time: Option<String>,

    /// Name for the fork (default: chosen by the provider)
    #[arg(long, env = "FORKGRES_NAME")]
    pub name: Option<String>,

    /// CPU in millicores, or "shared" (default: same as parent)
    #[arg(long, env = "FORKGRES_CPU")]
    pub cpu: Option<String>,

    /// Memory in GB, or "shared" (default: same as parent)
    #[arg(long, env = "FORKGRES_MEMORY")]
    pub memory: Option<String>,

    /// Record state so `forkgres cleanup` deletes the fork later
    #[arg(long, env = "FORKGRES_CLEANUP")]
    pub cleanup: bool,
}
