use clap::Parser;

use crate::models::Nivel;

#[derive(Parser, Debug, Clone)]
#[command(name = "admisiones", about = "Admissions campaign dashboard")]
pub struct Config {
    /// Base URL of the analytics backend
    #[arg(long, env = "API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Timeout for each backend request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Minutes without requests after which a dashboard session ends
    #[arg(long, env = "SESSION_IDLE_MINUTES", default_value = "120")]
    pub session_idle_minutes: i64,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the dashboard web server (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Fetch and reconcile the dashboard overview once, print it as JSON
    Snapshot {
        /// Academic level filter (TODOS, GRADO, POSGRADO)
        #[arg(long, default_value = "TODOS")]
        nivel: Nivel,

        /// Bearer token for the analytics backend
        #[arg(long, env = "ADMISIONES_TOKEN")]
        token: String,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}
