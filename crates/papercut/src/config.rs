//! Configuration snapshot taken from the environment and an optional `.env`.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

pub const XMLRPC_URL_KEY: &str = "PAPERCUT_XMLRPC_URL";
pub const AUTH_TOKEN_KEY: &str = "PAPERCUT_AUTH_TOKEN";
pub const TIMEOUT_MS_KEY: &str = "PAPERCUT_TIMEOUT_MS";

pub const DEFAULT_XMLRPC_URL: &str = "http://localhost:9191/rpc/api/xmlrpc";
pub const DEFAULT_AUTH_TOKEN: &str = "";
pub const DEFAULT_TIMEOUT_MS: f64 = 10_000.0;

/// Immutable key/value snapshot with typed accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Snapshot the process environment.
    ///
    /// Entries from a `.env` file in the working directory fill in keys the
    /// environment does not set. A missing `.env` is not an error.
    pub fn load() -> Self {
        let mut values: HashMap<String, String> = HashMap::new();

        match dotenvy::dotenv_iter() {
            Ok(entries) => {
                for (key, value) in entries.flatten() {
                    values.insert(key, value);
                }
                debug!(entries = values.len(), "loaded .env");
            }
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "ignoring unreadable .env"),
        }

        values.extend(std::env::vars());
        Self { values }
    }

    /// Build a snapshot from explicit pairs.
    #[allow(clippy::should_implement_trait)]
    pub fn from_iter<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The value for `key`, or `default` when unset.
    pub fn get(&self, key: &str, default: Option<&str>) -> Option<String> {
        self.values
            .get(key)
            .map(String::as_str)
            .or(default)
            .map(str::to_string)
    }

    /// `"1"` or `"true"` (any case) is true, any other value false.
    /// Unset keys yield `default`, or false.
    pub fn get_bool(&self, key: &str, default: Option<bool>) -> bool {
        match self.values.get(key) {
            Some(v) => v == "1" || v.eq_ignore_ascii_case("true"),
            None => default.unwrap_or(false),
        }
    }

    /// The value parsed as a finite number, otherwise `default` (NaN when
    /// there is none).
    pub fn get_number(&self, key: &str, default: Option<f64>) -> f64 {
        self.values
            .get(key)
            .map(|v| coerce_number(v))
            .filter(|n| n.is_finite())
            .unwrap_or(default.unwrap_or(f64::NAN))
    }
}

/// Numeric reading of a string: surrounding whitespace is ignored and an
/// empty string reads as 0. Unparsable text yields NaN.
pub fn coerce_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// Connection settings for one remote call.
#[derive(Clone)]
pub struct CallConfig {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
}

impl CallConfig {
    /// Read endpoint, token and timeout, falling back to the defaults.
    ///
    /// A timeout that is not a positive number uses the default; fractions
    /// round up to the next millisecond.
    pub fn from_config(config: &Config) -> Self {
        let url = config
            .get(XMLRPC_URL_KEY, Some(DEFAULT_XMLRPC_URL))
            .unwrap_or_else(|| DEFAULT_XMLRPC_URL.to_string());
        let token = config
            .get(AUTH_TOKEN_KEY, Some(DEFAULT_AUTH_TOKEN))
            .unwrap_or_default();

        let mut timeout_ms = config.get_number(TIMEOUT_MS_KEY, Some(DEFAULT_TIMEOUT_MS));
        if timeout_ms <= 0.0 {
            timeout_ms = DEFAULT_TIMEOUT_MS;
        }

        Self {
            url,
            token,
            timeout: Duration::from_millis(timeout_ms.ceil() as u64),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl std::fmt::Debug for CallConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_falls_back_to_default() {
        let config = Config::from_iter([("A", "x")]);
        assert_eq!(config.get("A", Some("d")).as_deref(), Some("x"));
        assert_eq!(config.get("B", Some("d")).as_deref(), Some("d"));
        assert_eq!(config.get("B", None), None);
    }

    #[test]
    fn get_keeps_empty_values() {
        let config = Config::from_iter([("A", "")]);
        assert_eq!(config.get("A", Some("d")).as_deref(), Some(""));
    }

    #[test]
    fn get_bool_parsing() {
        let config = Config::from_iter([("ONE", "1"), ("T", "TrUe"), ("NO", "yes"), ("Z", "0")]);
        assert!(config.get_bool("ONE", None));
        assert!(config.get_bool("T", Some(false)));
        assert!(!config.get_bool("NO", Some(true)));
        assert!(!config.get_bool("Z", Some(true)));
        assert!(config.get_bool("MISSING", Some(true)));
        assert!(!config.get_bool("MISSING", None));
    }

    #[test]
    fn get_number_parsing() {
        let config = Config::from_iter([
            ("N", " 2500 "),
            ("F", "1.5e3"),
            ("BAD", "ten"),
            ("EMPTY", ""),
            ("INF", "inf"),
        ]);
        assert_eq!(config.get_number("N", Some(1.0)), 2500.0);
        assert_eq!(config.get_number("F", None), 1500.0);
        assert_eq!(config.get_number("BAD", Some(7.0)), 7.0);
        assert_eq!(config.get_number("EMPTY", Some(7.0)), 0.0);
        assert_eq!(config.get_number("INF", Some(7.0)), 7.0);
        assert_eq!(config.get_number("MISSING", Some(3.0)), 3.0);
        assert!(config.get_number("MISSING", None).is_nan());
    }

    #[test]
    fn call_config_defaults() {
        let call = CallConfig::from_config(&Config::default());
        assert_eq!(call.url, DEFAULT_XMLRPC_URL);
        assert_eq!(call.token, "");
        assert_eq!(call.timeout_ms(), 10_000);
    }

    #[test]
    fn call_config_reads_values() {
        let config = Config::from_iter([
            (XMLRPC_URL_KEY, "https://print.example.com:9192/rpc/api/xmlrpc"),
            (AUTH_TOKEN_KEY, "s3cret"),
            (TIMEOUT_MS_KEY, "2500"),
        ]);
        let call = CallConfig::from_config(&config);
        assert_eq!(call.url, "https://print.example.com:9192/rpc/api/xmlrpc");
        assert_eq!(call.token, "s3cret");
        assert_eq!(call.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn non_positive_timeout_uses_default() {
        for raw in ["0", "-5", "abc"] {
            let config = Config::from_iter([(TIMEOUT_MS_KEY, raw)]);
            assert_eq!(CallConfig::from_config(&config).timeout_ms(), 10_000, "{raw}");
        }
    }

    #[test]
    fn fractional_timeout_rounds_up() {
        for (raw, expected) in [("0.5", 1), ("0.0001", 1), ("2500.2", 2501)] {
            let config = Config::from_iter([(TIMEOUT_MS_KEY, raw)]);
            assert_eq!(CallConfig::from_config(&config).timeout_ms(), expected, "{raw}");
        }
    }

    #[test]
    fn debug_redacts_token() {
        let config = Config::from_iter([(AUTH_TOKEN_KEY, "s3cret")]);
        let debug = format!("{:?}", CallConfig::from_config(&config));
        assert!(!debug.contains("s3cret"));
    }
}
