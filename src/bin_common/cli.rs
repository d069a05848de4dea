//! CLI utilities for binaries
//!
//! Config path resolution and argument handling.

use std::path::PathBuf;

/// Which configuration file to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Engine configuration (maker_config.yaml)
    Maker,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Maker => "config/maker_config.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    pub fn env_var_name(&self) -> &str {
        "MAKER_CONFIG_PATH"
    }
}

/// Config path from the environment, or the type's default
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Flags recognised on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--observe`: record top of book, never trade
    pub observe: bool,
    /// `--config <path>`
    pub config_path: Option<PathBuf>,
}

/// Parse arguments (excluding the program name). Unknown flags are returned
/// as the error.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--observe" => parsed.observe = true,
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config_path = Some(path.into());
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Maker.default_path(), "config/maker_config.yaml");

        let custom = ConfigType::Custom("custom/path.yaml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yaml");
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(args(&[])).unwrap(), CliArgs::default());

        let parsed = parse_args(args(&["--observe", "--config", "x.yaml"])).unwrap();
        assert!(parsed.observe);
        assert_eq!(parsed.config_path, Some(PathBuf::from("x.yaml")));

        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--live"])).is_err());
    }
}
