use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "esglens")]
#[command(about = "Compares ESG report keywords against reporting standards", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".esglens")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_upload_dir")]
    upload_dir: PathBuf,
    #[serde(default = "default_standards_path")]
    standards_path: PathBuf,
    #[serde(default = "default_true")]
    pub retain_uploads: bool,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_port() -> u16 {
    8000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_standards_path() -> PathBuf {
    PathBuf::from("standards keywords.csv")
}

fn default_true() -> bool {
    true
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for App {
    fn default() -> Self {
        App {
            port: default_port(),
            upload_dir: default_upload_dir(),
            standards_path: default_standards_path(),
            retain_uploads: true,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn get_standards_path(&self) -> &Path {
        &self.standards_path
    }
}

/// Knobs for the extraction and keyword pipeline.
#[derive(Debug, Deserialize, Clone)]
pub struct Analysis {
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_tfidf_top_n")]
    pub tfidf_top_n: usize,
    #[serde(default = "default_contextual_top_n")]
    pub contextual_top_n: usize,
    /// Caps how many pages are read from a single PDF. `None` reads them all.
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_preview_chars() -> usize {
    2000
}

fn default_tfidf_top_n() -> usize {
    10
}

fn default_contextual_top_n() -> usize {
    5
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for Analysis {
    fn default() -> Self {
        Analysis {
            preview_chars: default_preview_chars(),
            tfidf_top_n: default_tfidf_top_n(),
            contextual_top_n: default_contextual_top_n(),
            max_pages: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub analysis: Analysis,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // Handle default values like ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(variable = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let cfg = Config::from_yaml("{}").unwrap();
        assert_eq!(cfg.app.get_port(), 8000);
        assert_eq!(cfg.app.get_upload_dir(), Path::new("uploads"));
        assert_eq!(cfg.app.get_standards_path(), Path::new("standards keywords.csv"));
        assert!(cfg.app.retain_uploads);
        assert_eq!(cfg.analysis.preview_chars, 2000);
        assert_eq!(cfg.analysis.tfidf_top_n, 10);
        assert_eq!(cfg.analysis.contextual_top_n, 5);
        assert_eq!(cfg.analysis.max_pages, None);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
app:
  port: 9100
  retain_uploads: false
analysis:
  max_pages: 40
"#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_port(), 9100);
        assert!(!cfg.app.retain_uploads);
        assert_eq!(cfg.analysis.max_pages, Some(40));
        assert_eq!(cfg.analysis.preview_chars, 2000);
    }

    #[test]
    fn test_env_default_substitution() {
        let yaml = r#"
app:
  port: ${ESGLENS_TEST_SURELY_UNSET_PORT:-8123}
  upload_dir: "${ESGLENS_TEST_SURELY_UNSET_DIR:-/tmp/esg}"
"#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_port(), 8123);
        assert_eq!(cfg.app.get_upload_dir(), Path::new("/tmp/esg"));
    }

    #[test]
    fn test_unterminated_placeholder_is_left_alone() {
        let out = Config::substitute_env_vars("path: ${OPEN").unwrap();
        assert_eq!(out, "path: ${OPEN");
    }
}
