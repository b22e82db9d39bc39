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

#![allow(non_upper_case_globals)]

//! The subset of the DICOM data dictionary the worklist schema uses.
//! Implicit VR files carry no VR on the wire, so both the encoder (to validate
//! what it is asked to write) and the reader (to know how to decode what it
//! finds) go through `lookup`.
// https://dicom.nema.org/medical/dicom/current/output/chtml/part06/chapter_6.html

use crate::data_set::ValueRepresentation;
use crate::data_set::ValueRepresentation::*;
use crate::tags::Tag;

#[derive(Debug, PartialEq)]
pub struct DictionaryEntry {
  pub tag: Tag,
  pub name: &'static str,
  pub vr: ValueRepresentation,
}

// File Meta Information
pub const FileMetaInformationGroupLength: Tag = Tag::new(0x0002, 0x0000);
pub const FileMetaInformationVersion: Tag = Tag::new(0x0002, 0x0001);
pub const MediaStorageSOPClassUID: Tag = Tag::new(0x0002, 0x0002);
pub const MediaStorageSOPInstanceUID: Tag = Tag::new(0x0002, 0x0003);
pub const TransferSyntaxUID: Tag = Tag::new(0x0002, 0x0010);
pub const ImplementationClassUID: Tag = Tag::new(0x0002, 0x0012);
pub const ImplementationVersionName: Tag = Tag::new(0x0002, 0x0013);

// Study, institution and physicians
pub const AccessionNumber: Tag = Tag::new(0x0008, 0x0050);
pub const Modality: Tag = Tag::new(0x0008, 0x0060);
pub const InstitutionName: Tag = Tag::new(0x0008, 0x0080);
pub const ReferringPhysicianName: Tag = Tag::new(0x0008, 0x0090);
pub const StudyDescription: Tag = Tag::new(0x0008, 0x1030);
pub const InstitutionalDepartmentName: Tag = Tag::new(0x0008, 0x1040);

// Patient
pub const PatientName: Tag = Tag::new(0x0010, 0x0010);
pub const PatientID: Tag = Tag::new(0x0010, 0x0020);
pub const PatientBirthDate: Tag = Tag::new(0x0010, 0x0030);
pub const PatientSex: Tag = Tag::new(0x0010, 0x0040);

pub const StudyInstanceUID: Tag = Tag::new(0x0020, 0x000D);
pub const RequestedProcedureDescription: Tag = Tag::new(0x0032, 0x1060);

// Scheduled Procedure Step
pub const ScheduledStationAETitle: Tag = Tag::new(0x0040, 0x0001);
pub const ScheduledProcedureStepStartDate: Tag = Tag::new(0x0040, 0x0002);
pub const ScheduledProcedureStepStartTime: Tag = Tag::new(0x0040, 0x0003);
pub const ScheduledPerformingPhysicianName: Tag = Tag::new(0x0040, 0x0006);
pub const ScheduledProcedureStepDescription: Tag = Tag::new(0x0040, 0x0007);
pub const ScheduledProcedureStepID: Tag = Tag::new(0x0040, 0x0009);
pub const ScheduledProcedureStepSequence: Tag = Tag::new(0x0040, 0x0100);
pub const RequestedProcedureID: Tag = Tag::new(0x0040, 0x1001);

// Sequence delimiters. They have no VR.
pub const Item: Tag = Tag::new(0xFFFE, 0xE000);
pub const ItemDelimitationItem: Tag = Tag::new(0xFFFE, 0xE00D);
pub const SequenceDelimitationItem: Tag = Tag::new(0xFFFE, 0xE0DD);

macro_rules! entry {
  ($tag:ident, $vr:ident) => {
    DictionaryEntry { tag: $tag, name: stringify!($tag), vr: $vr }
  };
}

// Sorted by tag.
pub static DICTIONARY: &[DictionaryEntry] = &[
  entry!(FileMetaInformationGroupLength, UL),
  entry!(FileMetaInformationVersion, OB),
  entry!(MediaStorageSOPClassUID, UI),
  entry!(MediaStorageSOPInstanceUID, UI),
  entry!(TransferSyntaxUID, UI),
  entry!(ImplementationClassUID, UI),
  entry!(ImplementationVersionName, SH),
  entry!(AccessionNumber, SH),
  entry!(Modality, CS),
  entry!(InstitutionName, LO),
  entry!(ReferringPhysicianName, PN),
  entry!(StudyDescription, LO),
  entry!(InstitutionalDepartmentName, LO),
  entry!(PatientName, PN),
  entry!(PatientID, LO),
  entry!(PatientBirthDate, DA),
  entry!(PatientSex, CS),
  entry!(StudyInstanceUID, UI),
  entry!(RequestedProcedureDescription, LO),
  entry!(ScheduledStationAETitle, AE),
  entry!(ScheduledProcedureStepStartDate, DA),
  entry!(ScheduledProcedureStepStartTime, TM),
  entry!(ScheduledPerformingPhysicianName, PN),
  entry!(ScheduledProcedureStepDescription, LO),
  entry!(ScheduledProcedureStepID, SH),
  entry!(ScheduledProcedureStepSequence, SQ),
  entry!(RequestedProcedureID, SH),
];

pub fn lookup(tag: Tag) -> Option<&'static DictionaryEntry> {
  DICTIONARY
    .binary_search_by(|entry| entry.tag.cmp(&tag))
    .ok()
    .map(|index| &DICTIONARY[index])
}

/// Keyword of a tag, including the delimiters that are not in the dictionary.
pub fn name_of(tag: Tag) -> &'static str {
  match tag {
    Item => "Item",
    ItemDelimitationItem => "ItemDelimitationItem",
    SequenceDelimitationItem => "SequenceDelimitationItem",
    _ if tag.is_group_length() => "GenericGroupLength",
    _ => lookup(tag).map(|entry| entry.name).unwrap_or("Unknown Tag & Data"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dictionary_is_sorted_and_unique() {
    for pair in DICTIONARY.windows(2) {
      assert!(pair[0].tag < pair[1].tag, "{} >= {}", pair[0].name, pair[1].name);
    }
  }

  #[test]
  fn lookup_finds_keyword_and_vr() {
    let entry = lookup(ScheduledStationAETitle).unwrap();
    assert_eq!(entry.name, "ScheduledStationAETitle");
    assert_eq!(entry.vr, ValueRepresentation::AE);
    assert!(lookup(Tag::new(0x0009, 0x0010)).is_none());
    assert_eq!(name_of(Item), "Item");
    assert_eq!(name_of(Tag::new(0x0008, 0x0000)), "GenericGroupLength");
  }
}
