//! Service configuration
//!
//! Command-line flags with environment-variable fallbacks. The
//! database path defaults to the platform data directory.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "farmsight-api", about = "Paddock intelligence API service")]
pub struct Config {
    /// Address to bind the HTTP server on
    #[arg(long, env = "FARMSIGHT_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, env = "FARMSIGHT_DATABASE")]
    pub database: Option<PathBuf>,

    /// Seed a demo farm with paddocks into an empty database
    #[arg(
        long,
        env = "FARMSIGHT_SEED_DEMO",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub seed_demo_data: bool,

    /// OpenWeather API key; without it a synthetic forecast is used
    #[arg(long, env = "OPENWEATHER_API_KEY")]
    pub openweather_api_key: Option<String>,

    /// OpenWeather API base URL
    #[arg(
        long,
        env = "OPENWEATHER_BASE_URL",
        default_value = "https://api.openweathermap.org/data/2.5"
    )]
    pub openweather_base_url: String,
}

impl Config {
    /// Resolved database file path
    pub fn database_path(&self) -> PathBuf {
        match &self.database {
            Some(path) => path.clone(),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("farmsight"))
                .unwrap_or_else(|| PathBuf::from("./farmsight_data"))
                .join("farmsight.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse_from(["farmsight-api"]);
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert!(config.seed_demo_data);
        assert!(config.database_path().ends_with("farmsight.db"));
    }

    #[test]
    fn test_explicit_database_path() {
        let config = Config::parse_from(["farmsight-api", "--database", "/tmp/test.db"]);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/test.db"));
    }

    #[test]
    fn test_seed_flag_can_be_disabled() {
        let config = Config::parse_from(["farmsight-api", "--seed-demo-data", "false"]);
        assert!(!config.seed_demo_data);
    }
}
