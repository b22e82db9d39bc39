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

//! File Meta Information (group 0002).
// https://dicom.nema.org/medical/dicom/current/output/chtml/part10/chapter_7.html

use crate::data_set::{DataElement, DataSet, Value, ValueRepresentation};
use crate::dicom_tags::*;

/// Modality Worklist Information Model - FIND.
pub const WORKLIST_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.31";
/// Implicit VR Little Endian: Default Transfer Syntax for DICOM.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.8.498.1";
pub const IMPLEMENTATION_VERSION_NAME: &str = concat!("RWORKLIST_", env!("CARGO_PKG_VERSION"));

/// The group length is left out, the encoder computes it from what it writes.
pub fn build_meta(sop_instance_uid: &str) -> DataSet {
  let mut meta = DataSet::new();
  meta.put(DataElement::new(FileMetaInformationVersion, ValueRepresentation::OB, Value::Bytes(vec![0x00, 0x01])));
  meta.put_text(MediaStorageSOPClassUID, ValueRepresentation::UI, WORKLIST_SOP_CLASS_UID);
  meta.put_text(MediaStorageSOPInstanceUID, ValueRepresentation::UI, sop_instance_uid);
  meta.put_text(TransferSyntaxUID, ValueRepresentation::UI, IMPLICIT_VR_LITTLE_ENDIAN);
  meta.put_text(ImplementationClassUID, ValueRepresentation::UI, IMPLEMENTATION_CLASS_UID);
  meta.put_text(ImplementationVersionName, ValueRepresentation::SH, IMPLEMENTATION_VERSION_NAME);
  meta
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn meta_carries_the_mandatory_elements() {
    let meta = build_meta("2.25.1234");
    assert_eq!(meta.text(MediaStorageSOPClassUID), Some(WORKLIST_SOP_CLASS_UID));
    assert_eq!(meta.text(MediaStorageSOPInstanceUID), Some("2.25.1234"));
    assert_eq!(meta.text(TransferSyntaxUID), Some(IMPLICIT_VR_LITTLE_ENDIAN));
    assert_eq!(meta.text(ImplementationClassUID), Some(IMPLEMENTATION_CLASS_UID));
    assert_eq!(meta.text(ImplementationVersionName), Some(IMPLEMENTATION_VERSION_NAME));
    assert!(meta.get(FileMetaInformationGroupLength).is_none());
    assert!(meta.tags().all(|tag| tag.is_file_meta()));
  }

  #[test]
  fn version_name_fits_a_short_string() {
    assert!(IMPLEMENTATION_VERSION_NAME.len() <= ValueRepresentation::SH.max_length().unwrap());
  }
}
