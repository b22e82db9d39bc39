// Copyright (c) 2023 Jean-Daniel Michaud
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::env;
use std::path::Path;
use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::builder::{BuildOptions, WorklistDefaults};
use crate::encoder::{EncodeOptions, SequenceLength};
use crate::error::DicomError;
use crate::generator::GeneratorOptions;

/// The configuration compiled into the binaries.
pub const DEFAULT_CONFIG: &str = include_str!("../config.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub worklist_dir: PathBuf,
  pub log_level: String,
  pub sequence_length: SequenceLength,
  pub strict_lengths: bool,
  pub normalize_person_names: bool,
  pub defaults: WorklistDefaults,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      worklist_dir: PathBuf::from("worklists"),
      log_level: "info".to_string(),
      sequence_length: SequenceLength::Defined,
      strict_lengths: false,
      normalize_person_names: false,
      defaults: WorklistDefaults::default(),
    }
  }
}

impl Config {
  pub fn parse(content: &str) -> Result<Config, DicomError> {
    Ok(serde_yaml::from_str(content)?)
  }

  pub fn log_level(&self) -> Result<LevelFilter, DicomError> {
    self.log_level.parse::<LevelFilter>()
      .map_err(|_| DicomError::Config(format!("unknown log level: {}", self.log_level)))
  }

  pub fn generator_options(&self) -> GeneratorOptions {
    GeneratorOptions {
      build: BuildOptions {
        defaults: self.defaults.clone(),
        normalize_person_names: self.normalize_person_names,
      },
      encode: EncodeOptions {
        sequence_length: self.sequence_length,
        strict_lengths: self.strict_lengths,
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigProvenance {
  Default,
  XdgPath(String),
  CustomPath(String),
}

pub struct ConfigAccess {
  pub content: String,
  pub provenance: ConfigProvenance,
}

fn is_file_not_empty<P: AsRef<Path>>(path: P) -> bool {
  match std::fs::metadata(path) {
    Ok(metadata) => metadata.len() > 0,
    Err(..) => false,
  }
}

/// `$XDG_CONFIG_HOME/<package>/config.yaml`, `$HOME/.config` standing in for
/// an unset `XDG_CONFIG_HOME`.
pub fn default_config_file_path() -> Option<PathBuf> {
  let config_home = match env::var("XDG_CONFIG_HOME") {
    Ok(config_home) if !config_home.is_empty() => PathBuf::from(config_home),
    _ => PathBuf::from(env::var("HOME").ok()?).join(".config"),
  };
  Some(config_home.join(env!("CARGO_PKG_NAME")).join("config.yaml"))
}

fn read_config(
  config_path: &Option<PathBuf>,
  default_config_file_path: Option<PathBuf>,
  default_config: &str,
) -> Result<ConfigAccess, DicomError> {
  // A config file provided on the command line must exist
  if let Some(config_file) = config_path {
    let content = std::fs::read_to_string(config_file)
      .map_err(|e| DicomError::Config(format!("{}: {}", e, config_file.display())))?;
    return Ok(ConfigAccess {
      content,
      provenance: ConfigProvenance::CustomPath(config_file.to_string_lossy().to_string()),
    });
  }
  // Otherwise, try the standard path
  if let Some(path) = default_config_file_path.filter(|path| is_file_not_empty(path)) {
    let content = std::fs::read_to_string(&path)
      .map_err(|e| DicomError::Config(format!("{}: {}", e, path.display())))?;
    return Ok(ConfigAccess {
      content,
      provenance: ConfigProvenance::XdgPath(path.to_string_lossy().to_string()),
    });
  }
  // Otherwise, just use the embedded config file
  Ok(ConfigAccess { content: default_config.to_string(), provenance: ConfigProvenance::Default })
}

// Get the config file from the command line option --config
// Otherwise get it from XDG_CONFIG_HOME
// Otherwise use the default.
pub fn get_config(config_path: &Option<PathBuf>, default_config: &str) -> Result<ConfigAccess, DicomError> {
  read_config(config_path, default_config_file_path(), default_config)
}
