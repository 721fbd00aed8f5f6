use std::net::SocketAddr;

use anyhow::Context;

use crate::notify::SmtpSettings;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 900;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub sweep_interval_secs: u64,
    /// Process-level SMTP fallback for tenants without an `EmailConfig` row.
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a Postgres instance")?;
        let bind_addr = env_or("PERFCYCLE_BIND", DEFAULT_BIND)
            .parse()
            .context("PERFCYCLE_BIND is not a valid socket address")?;
        let sweep_interval_secs = parse_u64(
            std::env::var("PERFCYCLE_SWEEP_INTERVAL_SECS").ok(),
            DEFAULT_SWEEP_INTERVAL_SECS,
        );

        Ok(AppConfig {
            database_url,
            bind_addr,
            sweep_interval_secs,
            smtp: smtp_from_env(),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}

/// Fallback SMTP from the environment; present only when a host and a from
/// address are both configured.
fn smtp_from_env() -> Option<SmtpSettings> {
    let host = std::env::var("SMTP_HOST").ok()?;
    let from_email = std::env::var("SMTP_FROM_EMAIL").ok()?;
    Some(SmtpSettings {
        host,
        port: parse_u64(std::env::var("SMTP_PORT").ok(), 587) as u16,
        username: env_or("SMTP_USERNAME", ""),
        password: env_or("SMTP_PASSWORD", ""),
        from_email,
        from_name: env_or("SMTP_FROM_NAME", "Perfcycle"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_u64_falls_back_on_garbage() {
        assert_eq!(parse_u64(None, 900), 900);
        assert_eq!(parse_u64(Some("oops".to_string()), 900), 900);
        assert_eq!(parse_u64(Some("120".to_string()), 900), 120);
    }
}
