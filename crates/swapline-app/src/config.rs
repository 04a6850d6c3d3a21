// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WindowCfg {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub resizable: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DiagnosticsCfg {
    /// Validation layer + debug messenger. Defaults to the build profile.
    #[serde(default = "default_validation")]
    pub validation: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct AppCfg {
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub diagnostics: DiagnosticsCfg,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            resizable: false,
        }
    }
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg {
            validation: default_validation(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_title() -> String {
    "swapline".to_string()
}
fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_validation() -> bool {
    cfg!(debug_assertions)
}
fn default_log_filter() -> String {
    "info".to_string()
}

pub fn parse_cfg(text: &str) -> Result<AppCfg> {
    toml::from_str::<AppCfg>(text).context("parse config")
}

/// A missing file is not an error; defaults apply.
pub fn load_cfg(path: &Path) -> Result<AppCfg> {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).with_context(|| path.display().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(AppCfg::default()),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_cfg("").unwrap(), AppCfg::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_cfg(
            r#"
            [window]
            title = "probe"
            width = 1280

            [diagnostics]
            validation = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.window.title, "probe");
        assert_eq!(cfg.window.width, 1280);
        assert_eq!(cfg.window.height, 600);
        assert!(!cfg.window.resizable);
        assert!(!cfg.diagnostics.validation);
        assert_eq!(cfg.diagnostics.log_filter, "info");
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(parse_cfg("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = load_cfg(Path::new("definitely/not/here/swapline.toml")).unwrap();
        assert_eq!(cfg, AppCfg::default());
    }
}
