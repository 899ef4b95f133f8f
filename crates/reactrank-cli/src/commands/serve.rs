use std::path::PathBuf;

use anyhow::Context;
use reactrank_core::{Config, RankService};

pub struct ServeCommandConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
    pub ttl_secs: Option<u64>,
}

/// Merge the config file (if any) with command-line overrides.
pub fn resolve_config(cmd: &ServeCommandConfig) -> anyhow::Result<Config> {
    let mut config = match &cmd.config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(host) = &cmd.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    if let Some(ttl) = cmd.ttl_secs {
        config.ranking.stats_ttl_secs = ttl;
    }
    config.validate()?;
    Ok(config)
}

pub fn run(cmd: ServeCommandConfig) -> anyhow::Result<()> {
    let config = resolve_config(&cmd)?;
    let store = super::make_store(cmd.seed_path.as_deref())?;
    let service = RankService::from_config(store, &config.ranking);

    let base = format!("http://{}:{}", config.server.host, config.server.port);
    println!("reactrank server v{}", reactrank_core::VERSION);
    println!("   {base}");
    println!("   summary TTL: {}s", config.ranking.stats_ttl_secs);
    println!();
    println!("   Endpoints:");
    println!("     GET  /                 API index");
    println!("     GET  /health           Health and cached summary ages");
    println!("     POST /api/user         Register a user");
    println!("     POST /api/visual       Record a visual test result");
    println!("     POST /api/auditory     Record an auditory test result");
    println!("     GET  /api/rank         Percentile rank (?user=)");
    println!("     GET  /api/result       Latest raw samples (?user=)");
    println!("     GET  /api/statistics   Trimmed statistics (?user= optional)");
    println!();

    let rt = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    rt.block_on(reactrank_server::run_server(
        service,
        &config.server.host,
        config.server.port,
    ))
    .with_context(|| format!("serve on {base}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cmd() -> ServeCommandConfig {
        ServeCommandConfig {
            host: None,
            port: None,
            config_path: None,
            seed_path: None,
            ttl_secs: None,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_config(&cmd()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000\n[ranking]\nstats_ttl_secs = 60").unwrap();
        let config = resolve_config(&ServeCommandConfig {
            port: Some(9100),
            config_path: Some(file.path().to_path_buf()),
            ..cmd()
        })
        .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.ranking.stats_ttl_secs, 60);
    }

    #[test]
    fn test_zero_ttl_flag_rejected() {
        assert!(
            resolve_config(&ServeCommandConfig {
                ttl_secs: Some(0),
                ..cmd()
            })
            .is_err()
        );
    }
}
