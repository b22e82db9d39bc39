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

//! Record to file pipeline: build the data set, build the meta, encode, store.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use log::{info, warn};
use serde::Deserialize;

use crate::builder::{build, BuildOptions, WorklistRecord};
use crate::encoder::{encode_with, EncodeOptions};
use crate::error::DicomError;
use crate::meta::build_meta;
use crate::store::WorklistStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorOptions {
  pub build: BuildOptions,
  pub encode: EncodeOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedWorklist {
  pub bytes: Vec<u8>,
  pub sop_instance_uid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWorklist {
  pub filename: String,
  pub path: PathBuf,
  pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome<T> {
  Created(T),
  Failed(String),
}

impl<T> BatchOutcome<T> {
  pub fn is_created(&self) -> bool {
    matches!(self, BatchOutcome::Created(_))
  }
}

pub fn encode_record(record: &WorklistRecord, options: &GeneratorOptions) -> Result<EncodedWorklist, DicomError> {
  let worklist = build(record, &options.build)?;
  let meta = build_meta(&worklist.sop_instance_uid);
  let bytes = encode_with(&meta, &worklist.data_set, &options.encode)?;
  Ok(EncodedWorklist { bytes, sop_instance_uid: worklist.sop_instance_uid })
}

/// Runs `f` on every item. A failing item is reported in its slot and does not
/// stop the others.
pub fn process_batch<I, T, F>(items: &[I], mut f: F) -> Vec<BatchOutcome<T>>
where
  F: FnMut(&I) -> Result<T, DicomError>,
{
  let outcomes: Vec<BatchOutcome<T>> = items.iter().enumerate().map(|(index, item)| match f(item) {
    Ok(created) => BatchOutcome::Created(created),
    Err(e) => {
      warn!("Batch item {} failed: {}", index, e);
      BatchOutcome::Failed(e.to_string())
    },
  }).collect();
  let created = outcomes.iter().filter(|outcome| outcome.is_created()).count();
  info!("Created {}/{} worklist files", created, items.len());
  outcomes
}

pub struct WorklistGenerator {
  store: WorklistStore,
  options: GeneratorOptions,
}

impl WorklistGenerator {
  pub fn new(store: WorklistStore, options: GeneratorOptions) -> Self {
    WorklistGenerator { store, options }
  }

  pub fn store(&self) -> &WorklistStore {
    &self.store
  }

  pub fn create(&self, record: &WorklistRecord) -> Result<CreatedWorklist, DicomError> {
    let encoded = encode_record(record, &self.options)?;
    let filename = WorklistStore::filename_for(record.accession_number.as_deref(), Local::now().naive_local());
    let stored = self.store.write(&filename, &encoded.bytes)?;
    Ok(CreatedWorklist { filename: stored.filename, path: stored.path, size: stored.size })
  }

  pub fn create_batch(&self, records: &[WorklistRecord]) -> Vec<BatchOutcome<CreatedWorklist>> {
    process_batch(records, |record| self.create(record))
  }

  /// Like `create_batch` but on raw JSON values: a value that is not a valid
  /// record fails in its own slot.
  pub fn create_batch_from_json(&self, values: &[serde_json::Value]) -> Vec<BatchOutcome<CreatedWorklist>> {
    process_batch(values, |value| {
      let record = WorklistRecord::deserialize(value)?;
      self.create(&record)
    })
  }
}

/// The demonstration record, scheduled on `today`.
pub fn sample_record(today: NaiveDate) -> WorklistRecord {
  let text = |value: &str| Some(value.to_string());
  WorklistRecord {
    patient_id: text("P123456"),
    patient_name: text("DOE^JOHN^MIDDLE"),
    patient_birth_date: text("1985-05-15"),
    patient_sex: text("M"),
    accession_number: text("ACC123456"),
    study_description: text("Chest X-Ray"),
    scheduled_date: Some(today.format("%Y-%m-%d").to_string()),
    scheduled_time: text("14:30"),
    modality: text("CR"),
    scheduled_station_ae_title: text("ORTHANC"),
    scheduled_procedure_step_description: text("Chest X-Ray PA and Lateral"),
    requested_procedure_description: text("Chest X-Ray - Routine"),
    referring_physician: text("DR^SMITH^ROBERT"),
    performing_physician: text("DR^JOHNSON^MARY"),
    institution_name: text("Hasta Radiologi"),
    department_name: text("Radiology"),
    ..Default::default()
  }
}
