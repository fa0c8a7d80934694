use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::WxNowError;
use crate::units::UnitSystem;
use crate::zone::LocalZone;

const DEFAULT_FILENAME: &str = "/var/tmp/wxnow.txt";
const DEFAULT_TABLE: &str = "archive";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Which station event triggers a new wxnow.txt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Every live sensor reading
    Loop,
    /// Every new record in the archive
    Archive,
}

impl FromStr for Binding {
    type Err = WxNowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loop" => Ok(Binding::Loop),
            "archive" => Ok(Binding::Archive),
            other => Err(WxNowError::Config(format!(
                "WXNOW_BINDING must be 'loop' or 'archive', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub filename: PathBuf,
    pub binding: Binding,
    pub database_url: String,
    pub archive_table: String,
    pub archive_units: UnitSystem,
    pub zone: LocalZone,
    /// MAC address of the outdoor RuuviTag, used by the loop binding
    pub ruuvi_tag: Option<String>,
    pub poll_interval_secs: u64,
}

impl ServiceConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Ok(Self::from_lookup(|key| env::var(key).ok())?)
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WxNowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| WxNowError::Config("DATABASE_URL environment variable not set".into()))?;

        let filename = lookup("WXNOW_FILENAME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILENAME));

        let binding = match lookup("WXNOW_BINDING") {
            Some(value) => value.parse()?,
            None => Binding::Loop,
        };

        let archive_table = lookup("ARCHIVE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
        if archive_table.is_empty()
            || !archive_table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(WxNowError::Config(format!(
                "ARCHIVE_TABLE '{}' is not a plain table name",
                archive_table
            )));
        }

        let archive_units = match lookup("ARCHIVE_UNIT_SYSTEM") {
            Some(value) => value.parse()?,
            None => UnitSystem::Us,
        };

        let zone = match lookup("TZ") {
            Some(name) => LocalZone::from_name(name.trim_start_matches(':'))?,
            None => LocalZone::utc(),
        };

        let ruuvi_tag = lookup("RUUVI_TAG")
            .map(|mac| mac.trim().to_uppercase())
            .filter(|mac| !mac.is_empty());
        if binding == Binding::Loop && ruuvi_tag.is_none() {
            return Err(WxNowError::Config(
                "Loop binding needs an outdoor sensor. Please set RUUVI_TAG to its MAC address".into(),
            ));
        }

        let poll_interval_secs = match lookup("POLL_INTERVAL_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    WxNowError::Config(format!(
                        "POLL_INTERVAL_SECS '{}' is not a positive number",
                        value
                    ))
                })?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(ServiceConfig {
            filename,
            binding,
            database_url,
            archive_table,
            archive_units,
            zone,
            ruuvi_tag,
            poll_interval_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://weewx@localhost/weewx"),
            ("RUUVI_TAG", "c3:11:22:33:44:55"),
        ]))
        .unwrap();
        assert_eq!(config.filename, PathBuf::from("/var/tmp/wxnow.txt"));
        assert_eq!(config.binding, Binding::Loop);
        assert_eq!(config.archive_table, "archive");
        assert_eq!(config.archive_units, UnitSystem::Us);
        assert_eq!(config.zone, LocalZone::utc());
        assert_eq!(config.ruuvi_tag.as_deref(), Some("C3:11:22:33:44:55"));
        assert_eq!(config.poll_interval_secs, 60);
    }

    #[test]
    fn archive_binding_without_tag() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://weewx@localhost/weewx"),
            ("WXNOW_BINDING", "Archive"),
            ("WXNOW_FILENAME", "/srv/www/wxnow.txt"),
            ("ARCHIVE_UNIT_SYSTEM", "metricwx"),
            ("TZ", ":Europe/Helsinki"),
            ("POLL_INTERVAL_SECS", "300"),
        ]))
        .unwrap();
        assert_eq!(config.binding, Binding::Archive);
        assert_eq!(config.filename, PathBuf::from("/srv/www/wxnow.txt"));
        assert_eq!(config.archive_units, UnitSystem::MetricWx);
        assert_eq!(config.zone.name(), "Europe/Helsinki");
        assert_eq!(config.ruuvi_tag, None);
        assert_eq!(config.poll_interval_secs, 300);
    }

    #[test]
    fn rejects_bad_values() {
        let base = [("DATABASE_URL", "postgres://x"), ("RUUVI_TAG", "AA")];
        assert!(ServiceConfig::from_lookup(lookup(&[("RUUVI_TAG", "AA")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[base[0]])).is_err());

        let mut bad = base.to_vec();
        bad.push(("WXNOW_BINDING", "hourly"));
        assert!(ServiceConfig::from_lookup(lookup(&bad)).is_err());

        let mut bad = base.to_vec();
        bad.push(("ARCHIVE_TABLE", "archive; drop table archive"));
        assert!(ServiceConfig::from_lookup(lookup(&bad)).is_err());

        let mut bad = base.to_vec();
        bad.push(("POLL_INTERVAL_SECS", "0"));
        assert!(ServiceConfig::from_lookup(lookup(&bad)).is_err());
    }
}
