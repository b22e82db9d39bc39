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

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde_json::Value;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use rworklist::builder::WorklistRecord;
use rworklist::config::{get_config, Config, ConfigProvenance, DEFAULT_CONFIG};
use rworklist::error::DicomError;
use rworklist::generator::{sample_record, BatchOutcome, CreatedWorklist, WorklistGenerator};
use rworklist::store::WorklistStore;

/// Generates DICOM Modality Worklist files
#[derive(Debug, Parser)]
#[command(version)]
struct Opt {
  /// configuration file (YAML)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,
  /// directory the worklist files are written to, overrides the configuration
  #[arg(short, long, global = true)]
  output_dir: Option<PathBuf>,
  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Create worklist files from a JSON record or an array of records
  Create {
    jsonfilepath: PathBuf,
  },
  /// Create a worklist file from a built-in sample record
  Sample,
  /// List the worklist files
  List,
  /// Delete a worklist file
  Delete {
    filename: String,
  },
  /// Delete the worklist files older than a number of days
  Cleanup {
    #[arg(long, default_value = "30")]
    days: u64,
  },
}

fn print_outcome(outcome: &BatchOutcome<CreatedWorklist>) {
  match outcome {
    BatchOutcome::Created(created) =>
      println!("Created worklist file: {} ({} bytes)", created.filename, created.size),
    BatchOutcome::Failed(error) => println!("Failed: {}", error),
  }
}

fn main() -> Result<(), DicomError> {
  let opt = Opt::parse();

  let config_access = get_config(&opt.config, DEFAULT_CONFIG)?;
  let config = Config::parse(&config_access.content)?;
  TermLogger::init(config.log_level()?, simplelog::Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
    .map_err(|e| DicomError::Config(e.to_string()))?;
  match &config_access.provenance {
    ConfigProvenance::Default => debug!("Using the embedded configuration"),
    ConfigProvenance::XdgPath(path) | ConfigProvenance::CustomPath(path) => info!("Configuration loaded from {}", path),
  }

  let worklist_dir = opt.output_dir.clone().unwrap_or_else(|| config.worklist_dir.clone());
  let store = WorklistStore::new(&worklist_dir)?;

  match opt.command {
    Command::Create { jsonfilepath } => {
      // Records of an array are checked one by one so a bad one does not
      // stop the others.
      let input: Value = serde_json::from_reader(BufReader::new(File::open(&jsonfilepath)?))?;
      let generator = WorklistGenerator::new(store, config.generator_options());
      match input {
        Value::Array(values) => {
          let outcomes = generator.create_batch_from_json(&values);
          outcomes.iter().for_each(print_outcome);
          let created = outcomes.iter().filter(|outcome| outcome.is_created()).count();
          println!("Created {}/{} worklist files", created, values.len());
        },
        value => {
          let record: WorklistRecord = serde_json::from_value(value)?;
          let created = generator.create(&record)?;
          println!("Created worklist file: {} ({} bytes)", created.filename, created.size);
        },
      }
    },
    Command::Sample => {
      let generator = WorklistGenerator::new(store, config.generator_options());
      let created = generator.create(&sample_record(Local::now().date_naive()))?;
      println!("Created sample worklist file: {} ({} bytes)", created.filename, created.size);
    },
    Command::List => {
      let files = store.list()?;
      for file in &files {
        println!("{}\t{}\t{}", file.filename, file.size, file.modified.format("%Y-%m-%d %H:%M:%S"));
      }
      let stats = store.stats()?;
      println!("{} worklist files in {}, {} bytes in total, {} bytes on average",
        stats.total_files, worklist_dir.display(), stats.total_size, stats.average_size);
    },
    Command::Delete { filename } => {
      store.delete(&filename)?;
      println!("Deleted {}", filename);
    },
    Command::Cleanup { days } => {
      let deleted = store.cleanup(Duration::from_secs(days * 24 * 60 * 60))?;
      println!("Cleaned up {} old worklist files", deleted.len());
    },
  }
  Ok(())
}
