use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::auth::AuthConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0:8050";

/// Runtime settings for the board server. Every option can also be set from
/// the environment (or a `.env` file).
#[derive(Debug, Clone, Parser)]
#[command(name = "taskboard")]
#[command(about = "Collaborative project and task board API")]
#[command(version)]
pub struct ServerConfig {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Address the HTTP listener binds to
    #[arg(long, env = "TASKBOARD_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Secret used to sign session tokens
    #[arg(long, env = "TASKBOARD_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    #[arg(long, env = "TASKBOARD_JWT_EXPIRY_SECS", default_value_t = 86_400)]
    pub jwt_expiry_secs: u64,

    #[arg(long, env = "TASKBOARD_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub db_max_connections: u32,

    #[arg(long, env = "TASKBOARD_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub db_acquire_timeout_secs: u64,

    /// Directory with a built client bundle, served for non-API paths
    #[arg(long, env = "TASKBOARD_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "TASKBOARD_LOG_JSON")]
    pub log_json: bool,

    /// Drop and recreate the public schema when migrations fail.
    /// Destroys all data; development databases only.
    #[arg(long)]
    pub reset_schema_on_migration_failure: bool,
}

impl ServerConfig {
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.jwt_secret.clone(), self.jwt_expiry_secs)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Explicit flags only; env fallbacks would make these depend on the shell.
    fn parse(extra: &[&str]) -> ServerConfig {
        let mut args = vec![
            "taskboard",
            "--database-url",
            "postgres://localhost/taskboard",
            "--jwt-secret",
            "dev-secret",
            "--bind",
            DEFAULT_BIND,
            "--jwt-expiry-secs",
            "86400",
            "--db-max-connections",
            "10",
            "--db-acquire-timeout-secs",
            "5",
        ];
        args.extend_from_slice(extra);
        ServerConfig::try_parse_from(args).expect("config should parse")
    }

    #[test]
    fn default_bind_uses_port_8050() {
        let addr: SocketAddr = DEFAULT_BIND.parse().expect("valid default bind");
        assert_eq!(addr.port(), 8050);
    }

    #[test]
    fn schema_reset_is_opt_in() {
        let config = parse(&[]);
        assert!(!config.reset_schema_on_migration_failure);

        let config = parse(&["--reset-schema-on-migration-failure"]);
        assert!(config.reset_schema_on_migration_failure);
    }

    #[test]
    fn builds_auth_and_pool_settings() {
        let config = parse(&["--jwt-expiry-secs", "60", "--db-acquire-timeout-secs", "2"]);
        let auth = config.auth_config();
        assert_eq!(auth.jwt_expiry_secs, 60);
        assert_eq!(config.db_acquire_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn rejects_malformed_bind_address() {
        let result = ServerConfig::try_parse_from([
            "taskboard",
            "--database-url",
            "postgres://localhost/taskboard",
            "--jwt-secret",
            "dev-secret",
            "--bind",
            "not-an-address",
        ]);
        assert!(result.is_err());
    }
}
