//! Supported relational engine families.

use serde::{Deserialize, Serialize};

/// The engine family a channel talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    MySql,
    /// Covers the `postgresql` config key.
    #[serde(rename = "postgresql")]
    Postgres,
    SqlServer,
    Sqlite,
}

/// Resolution precedence: the first driver with an engine section present
/// wins, later candidates are ignored even if also configured.
pub const DRIVER_ORDER: [Driver; 4] = [
    Driver::MySql,
    Driver::Postgres,
    Driver::SqlServer,
    Driver::Sqlite,
];

impl Driver {
    /// The configuration key naming this driver's engine section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgresql",
            Self::SqlServer => "sqlserver",
            Self::Sqlite => "sqlite",
        }
    }

    /// Get the default port for this driver, if it has one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
            Self::SqlServer => Some(1433),
            Self::Sqlite => None,
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_order_is_fixed() {
        assert_eq!(
            DRIVER_ORDER,
            [
                Driver::MySql,
                Driver::Postgres,
                Driver::SqlServer,
                Driver::Sqlite
            ]
        );
    }

    #[test]
    fn test_driver_config_keys() {
        assert_eq!(Driver::MySql.as_str(), "mysql");
        assert_eq!(Driver::Postgres.as_str(), "postgresql");
        assert_eq!(Driver::SqlServer.as_str(), "sqlserver");
        assert_eq!(Driver::Sqlite.as_str(), "sqlite");
    }

    #[test]
    fn test_driver_serde_round_trip() {
        let json = serde_json::to_string(&Driver::Postgres).unwrap();
        assert_eq!(json, "\"postgresql\"");
        let back: Driver = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Driver::Postgres);
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(Driver::MySql.default_port(), Some(3306));
        assert_eq!(Driver::Sqlite.default_port(), None);
    }
}
