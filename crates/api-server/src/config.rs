//! Server configuration read from the environment

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TASKS_FILE: &str = "tasks.json";
const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding the task collection
    pub tasks_file: PathBuf,
    pub addr: SocketAddr,
    /// Upper bound for a single tasks API request
    pub request_timeout: Duration,
    /// How long in-flight requests may drain after a shutdown signal
    pub shutdown_grace: Duration,
    /// Credentials required to delete tasks
    pub admin: Credentials,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let addr = match env_string(&lookup, "TASKS_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid TASKS_ADDR {:?}, using {}", raw, DEFAULT_ADDR);
                default_addr()
            }),
            None => default_addr(),
        };

        Self {
            tasks_file: env_string(&lookup, "TASKS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TASKS_FILE)),
            addr,
            request_timeout: env_millis(
                &lookup,
                "TASKS_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            ),
            shutdown_grace: env_millis(&lookup, "TASKS_SHUTDOWN_GRACE_MS", DEFAULT_SHUTDOWN_GRACE_MS),
            admin: Credentials {
                username: env_string(&lookup, "TASKS_ADMIN_USER")
                    .unwrap_or_else(|| "admin".to_string()),
                password: env_string(&lookup, "TASKS_ADMIN_PASSWORD")
                    .unwrap_or_else(|| "secret".to_string()),
            },
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn env_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_millis(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> Duration {
    let millis = match env_string(lookup, name) {
        Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} {:?}, using {}ms", name, raw, default);
            default
        }),
        None => default,
    };
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tasks_file, PathBuf::from("tasks.json"));
        assert_eq!(config.addr, default_addr());
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.shutdown_grace, Duration::from_secs(5));
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password, "secret");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TASKS_FILE", "/var/lib/tasks/data.json"),
            ("TASKS_ADDR", "127.0.0.1:9000"),
            ("TASKS_REQUEST_TIMEOUT_MS", "250"),
            ("TASKS_ADMIN_USER", " root "),
        ]);
        assert_eq!(config.tasks_file, PathBuf::from("/var/lib/tasks/data.json"));
        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.admin.username, "root");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("TASKS_ADDR", "not an address"),
            ("TASKS_REQUEST_TIMEOUT_MS", "soon"),
            ("TASKS_FILE", "   "),
        ]);
        assert_eq!(config.addr, default_addr());
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.tasks_file, PathBuf::from("tasks.json"));
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", Config::default().admin);
        assert!(!rendered.contains("secret"));
    }
}
