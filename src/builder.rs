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

//! Maps a scheduling record onto the Modality Worklist attributes: a root data
//! set (patient, study, institution) holding a Scheduled Procedure Step
//! Sequence with a single item.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::data_set::{DataElement, DataSet, ValueRepresentation};
use crate::dicom_tags::*;
use crate::error::DicomError;
use crate::formatters::{format_date, format_person_name, format_time};
use crate::uid::generate_uid;

/// Scheduling data as received from the caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklistRecord {
  pub patient_name: Option<String>,
  pub patient_id: Option<String>,
  pub patient_birth_date: Option<String>,
  pub patient_sex: Option<String>,
  #[serde(rename = "studyInstanceUID")]
  pub study_instance_uid: Option<String>,
  #[serde(rename = "sopInstanceUID")]
  pub sop_instance_uid: Option<String>,
  pub accession_number: Option<String>,
  pub study_description: Option<String>,
  pub requested_procedure_description: Option<String>,
  pub institution_name: Option<String>,
  pub department_name: Option<String>,
  pub referring_physician: Option<String>,
  #[serde(rename = "scheduledStationAETitle")]
  pub scheduled_station_ae_title: Option<String>,
  pub scheduled_date: Option<String>,
  pub scheduled_time: Option<String>,
  pub scheduled_procedure_step_description: Option<String>,
  pub modality: Option<String>,
  pub performing_physician: Option<String>,
}

/// Values used for absent record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorklistDefaults {
  pub patient_sex: String,
  pub modality: String,
  pub scheduled_station_ae_title: String,
  pub institution_name: String,
  pub department_name: String,
}

impl Default for WorklistDefaults {
  fn default() -> Self {
    WorklistDefaults {
      patient_sex: "U".to_string(),
      modality: "CR".to_string(),
      scheduled_station_ae_title: "ORTHANC".to_string(),
      institution_name: "Hasta Radiologi".to_string(),
      department_name: "Radiology".to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOptions {
  pub defaults: WorklistDefaults,
  /// Rewrite "First Last" style names into PN "Last^First".
  pub normalize_person_names: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorklistDataSet {
  pub data_set: DataSet,
  /// Goes into the File Meta Information, not into the data set.
  pub sop_instance_uid: String,
}

pub const SCHEDULED_PROCEDURE_STEP_ID_SUFFIX: &str = "_SPS";

fn field<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
  value.as_deref().unwrap_or(default)
}

// Absent and empty both mean "not provided" for the optional physician names.
fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

pub fn build(record: &WorklistRecord, options: &BuildOptions) -> Result<WorklistDataSet, DicomError> {
  let defaults = &options.defaults;
  let person_name = |name: &str| if options.normalize_person_names {
    format_person_name(name)
  } else {
    name.to_string()
  };
  let accession_number = field(&record.accession_number, "");

  let mut data_set = DataSet::new();

  // Patient
  data_set.put_text(PatientName, ValueRepresentation::PN, person_name(field(&record.patient_name, "")));
  data_set.put_text(PatientID, ValueRepresentation::LO, field(&record.patient_id, ""));
  data_set.put_text(PatientBirthDate, ValueRepresentation::DA,
    format_date(record.patient_birth_date.as_deref()));
  data_set.put_text(PatientSex, ValueRepresentation::CS, field(&record.patient_sex, &defaults.patient_sex));

  // Study
  let study_instance_uid = match &record.study_instance_uid {
    Some(uid) => uid.clone(),
    None => generate_uid(),
  };
  data_set.put_text(StudyInstanceUID, ValueRepresentation::UI, study_instance_uid);
  data_set.put_text(AccessionNumber, ValueRepresentation::SH, accession_number);
  data_set.put_text(StudyDescription, ValueRepresentation::LO, field(&record.study_description, ""));

  // Requested procedure
  data_set.put_text(RequestedProcedureDescription, ValueRepresentation::LO,
    field(&record.requested_procedure_description, ""));
  data_set.put_text(RequestedProcedureID, ValueRepresentation::SH, accession_number);

  // Institution
  data_set.put_text(InstitutionName, ValueRepresentation::LO,
    field(&record.institution_name, &defaults.institution_name));
  data_set.put_text(InstitutionalDepartmentName, ValueRepresentation::LO,
    field(&record.department_name, &defaults.department_name));

  if let Some(physician) = non_empty(&record.referring_physician) {
    data_set.put_text(ReferringPhysicianName, ValueRepresentation::PN, person_name(physician));
  }

  data_set.put(DataElement::sequence(
    ScheduledProcedureStepSequence,
    vec![build_scheduled_procedure_step(record, options, &person_name)],
  ));

  for overlong in data_set.overlong_elements() {
    warn!("{}", overlong);
  }

  let sop_instance_uid = match &record.sop_instance_uid {
    Some(uid) => uid.clone(),
    None => generate_uid(),
  };

  Ok(WorklistDataSet { data_set, sop_instance_uid })
}

fn build_scheduled_procedure_step(
  record: &WorklistRecord,
  options: &BuildOptions,
  person_name: &dyn Fn(&str) -> String,
) -> DataSet {
  let defaults = &options.defaults;
  let mut step = DataSet::new();
  step.put_text(Modality, ValueRepresentation::CS, field(&record.modality, &defaults.modality));
  step.put_text(ScheduledStationAETitle, ValueRepresentation::AE,
    field(&record.scheduled_station_ae_title, &defaults.scheduled_station_ae_title));
  step.put_text(ScheduledProcedureStepStartDate, ValueRepresentation::DA,
    format_date(record.scheduled_date.as_deref()));
  step.put_text(ScheduledProcedureStepStartTime, ValueRepresentation::TM,
    format_time(record.scheduled_time.as_deref()));
  step.put_text(ScheduledProcedureStepDescription, ValueRepresentation::LO,
    field(&record.scheduled_procedure_step_description, ""));
  step.put_text(ScheduledProcedureStepID, ValueRepresentation::SH,
    format!("{}{}", field(&record.accession_number, ""), SCHEDULED_PROCEDURE_STEP_ID_SUFFIX));
  if let Some(physician) = non_empty(&record.performing_physician) {
    step.put_text(ScheduledPerformingPhysicianName, ValueRepresentation::PN, person_name(physician));
  }
  step
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::uid::is_valid_uid;

  fn step_of(worklist: &WorklistDataSet) -> &DataSet {
    &worklist.data_set.get(ScheduledProcedureStepSequence).unwrap().items().unwrap()[0]
  }

  #[test]
  fn empty_record_gets_defaults() {
    let worklist = build(&WorklistRecord::default(), &BuildOptions::default()).unwrap();
    let data_set = &worklist.data_set;
    assert_eq!(data_set.text(PatientName), Some(""));
    assert_eq!(data_set.text(PatientSex), Some("U"));
    assert_eq!(data_set.text(InstitutionName), Some("Hasta Radiologi"));
    assert_eq!(data_set.text(InstitutionalDepartmentName), Some("Radiology"));
    assert_eq!(data_set.text(RequestedProcedureID), Some(""));
    assert!(data_set.get(ReferringPhysicianName).is_none());
    assert!(is_valid_uid(data_set.text(StudyInstanceUID).unwrap()));
    assert!(is_valid_uid(&worklist.sop_instance_uid));

    let step = step_of(&worklist);
    assert_eq!(step.text(Modality), Some("CR"));
    assert_eq!(step.text(ScheduledStationAETitle), Some("ORTHANC"));
    assert_eq!(step.text(ScheduledProcedureStepID), Some("_SPS"));
    assert_eq!(step.text(ScheduledProcedureStepStartDate).unwrap().len(), 8);
    assert_eq!(step.text(ScheduledProcedureStepStartTime).unwrap().len(), 6);
    assert!(step.get(ScheduledPerformingPhysicianName).is_none());
  }

  #[test]
  fn sample_record_fields() {
    let record = WorklistRecord {
      accession_number: Some("ACC123456".to_string()),
      modality: Some("CR".to_string()),
      scheduled_time: Some("14:30".to_string()),
      patient_birth_date: Some("1985-05-15".to_string()),
      referring_physician: Some("DR^SMITH^ROBERT".to_string()),
      performing_physician: Some("DR^JOHNSON^MARY".to_string()),
      study_instance_uid: Some("1.2.3.4".to_string()),
      ..Default::default()
    };
    let worklist = build(&record, &BuildOptions::default()).unwrap();
    assert_eq!(worklist.data_set.text(AccessionNumber), Some("ACC123456"));
    assert_eq!(worklist.data_set.text(RequestedProcedureID), Some("ACC123456"));
    assert_eq!(worklist.data_set.text(PatientBirthDate), Some("19850515"));
    assert_eq!(worklist.data_set.text(StudyInstanceUID), Some("1.2.3.4"));
    assert_eq!(worklist.data_set.text(ReferringPhysicianName), Some("DR^SMITH^ROBERT"));

    let step = step_of(&worklist);
    assert_eq!(step.text(ScheduledProcedureStepID), Some("ACC123456_SPS"));
    assert_eq!(step.text(ScheduledProcedureStepStartTime), Some("143000"));
    assert_eq!(step.text(ScheduledPerformingPhysicianName), Some("DR^JOHNSON^MARY"));
  }

  #[test]
  fn present_empty_fields_are_not_defaulted() {
    let record = WorklistRecord {
      patient_sex: Some(String::new()),
      modality: Some(String::new()),
      referring_physician: Some(String::new()),
      ..Default::default()
    };
    let worklist = build(&record, &BuildOptions::default()).unwrap();
    assert_eq!(worklist.data_set.text(PatientSex), Some(""));
    assert_eq!(step_of(&worklist).text(Modality), Some(""));
    assert!(worklist.data_set.get(ReferringPhysicianName).is_none());
  }

  #[test]
  fn sequence_has_exactly_one_item() {
    let worklist = build(&WorklistRecord::default(), &BuildOptions::default()).unwrap();
    let element = worklist.data_set.get(ScheduledProcedureStepSequence).unwrap();
    assert_eq!(element.vr, ValueRepresentation::SQ);
    assert_eq!(element.items().unwrap().len(), 1);
  }

  #[test]
  fn configured_defaults_and_name_normalization() {
    let options = BuildOptions {
      defaults: WorklistDefaults { modality: "MR".to_string(), ..Default::default() },
      normalize_person_names: true,
    };
    let record = WorklistRecord {
      patient_name: Some("John Doe".to_string()),
      ..Default::default()
    };
    let worklist = build(&record, &options).unwrap();
    assert_eq!(worklist.data_set.text(PatientName), Some("Doe^John"));
    assert_eq!(step_of(&worklist).text(Modality), Some("MR"));
  }

  #[test]
  fn records_deserialize_from_camel_case_json() {
    let record: WorklistRecord = serde_json::from_str(r#"{
      "patientId": "P123456",
      "scheduledStationAETitle": "CT01",
      "studyInstanceUID": "1.2.3",
      "unknownField": "ignored"
    }"#).unwrap();
    assert_eq!(record.patient_id.as_deref(), Some("P123456"));
    assert_eq!(record.scheduled_station_ae_title.as_deref(), Some("CT01"));
    assert_eq!(record.study_instance_uid.as_deref(), Some("1.2.3"));
    assert!(record.patient_name.is_none());
  }
}
