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

//! Part 10 file writer: preamble, File Meta Information in Explicit VR Little
//! Endian, then the data set in Implicit VR Little Endian.
// https://dicom.nema.org/medical/dicom/current/output/chtml/part10/chapter_7.html
// https://dicom.nema.org/dicom/2013/output/chtml/part05/chapter_7.html

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::data_set::{DataElement, DataSet, Value, ValueRepresentation};
use crate::dicom_tags::{self, FileMetaInformationGroupLength, Item, ItemDelimitationItem, SequenceDelimitationItem};
use crate::error::DicomError;
use crate::tags::Tag;

pub const PREAMBLE_LENGTH: usize = 0x80;
pub const MAGIC: &[u8; 4] = b"DICM";
pub const UNDEFINED_LENGTH: u32 = 0xFFFFFFFF;

/// How sequences and their items announce their length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceLength {
  /// Computed byte length on every sequence and item, no delimiters.
  #[default]
  Defined,
  /// 0xFFFFFFFF lengths closed by Item and Sequence Delimitation Items.
  Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
  pub sequence_length: SequenceLength,
  /// Refuse values longer than their VR allows instead of writing them.
  pub strict_lengths: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syntax {
  ExplicitLittle,
  ImplicitLittle,
}

// Make sure the element is something the dictionary knows, with the VR the
// dictionary gives it and a value that fits the VR.
fn check_element(element: &DataElement, syntax: Syntax) -> Result<(), DicomError> {
  let tag = element.tag;
  let entry = dicom_tags::lookup(tag).ok_or_else(|| DicomError::schema(tag, "unknown tag"))?;
  if entry.vr != element.vr {
    return Err(DicomError::schema(tag, &format!(
      "VR {} does not match {} for {}", element.vr, entry.vr, entry.name)));
  }
  match syntax {
    Syntax::ExplicitLittle if !tag.is_file_meta() =>
      return Err(DicomError::schema(tag, "not a file meta information element")),
    Syntax::ImplicitLittle if tag.is_file_meta() =>
      return Err(DicomError::schema(tag, "file meta information element in the data set")),
    _ => (),
  }
  let compatible = match &element.value {
    Value::Text(_) => element.vr.is_text(),
    Value::Bytes(_) => matches!(element.vr, ValueRepresentation::OB | ValueRepresentation::UN),
    Value::UnsignedLong(_) => element.vr == ValueRepresentation::UL,
    Value::Sequence(_) => element.vr == ValueRepresentation::SQ,
  };
  if !compatible {
    return Err(DicomError::schema(tag, &format!("value cannot be encoded as {}", element.vr)));
  }
  Ok(())
}

fn write_header<W: Write>(writer: &mut W, element: &DataElement, length: u32, syntax: Syntax)
  -> Result<usize, DicomError> {
  writer.write_all(&element.tag.to_le_bytes())?;
  match syntax {
    Syntax::ImplicitLittle => {
      writer.write_all(&length.to_le_bytes())?;
      Ok(8)
    },
    Syntax::ExplicitLittle => {
      writer.write_all(element.vr.as_str().as_bytes())?;
      if element.vr.has_long_length() {
        // 2 reserved bytes then a 4 bytes length
        writer.write_all(&[0, 0])?;
        writer.write_all(&length.to_le_bytes())?;
        Ok(12)
      } else {
        let short_length = u16::try_from(length)
          .map_err(|_| DicomError::schema(element.tag, "value too long for a 16 bits length"))?;
        writer.write_all(&short_length.to_le_bytes())?;
        Ok(8)
      }
    },
  }
}

fn write_delimiter<W: Write>(writer: &mut W, tag: Tag, length: u32) -> Result<usize, DicomError> {
  writer.write_all(&tag.to_le_bytes())?;
  writer.write_all(&length.to_le_bytes())?;
  Ok(8)
}

fn write_sequence<W: Write>(writer: &mut W, element: &DataElement, items: &[DataSet], syntax: Syntax,
  options: &EncodeOptions) -> Result<usize, DicomError> {
  match options.sequence_length {
    SequenceLength::Defined => {
      // Stream all the items with their explicit length to a buffer, then
      // write the size of the buffer as the sequence length.
      let mut items_buffer: Vec<u8> = vec![];
      for item in items {
        let mut item_buffer: Vec<u8> = vec![];
        let item_length = write_data_set(&mut item_buffer, item, syntax, options)?;
        write_delimiter(&mut items_buffer, Item, item_length as u32)?;
        items_buffer.extend_from_slice(&item_buffer);
      }
      let header = write_header(writer, element, items_buffer.len() as u32, syntax)?;
      writer.write_all(&items_buffer)?;
      Ok(header + items_buffer.len())
    },
    SequenceLength::Undefined => {
      let mut written = write_header(writer, element, UNDEFINED_LENGTH, syntax)?;
      for item in items {
        written += write_delimiter(writer, Item, UNDEFINED_LENGTH)?;
        written += write_data_set(writer, item, syntax, options)?;
        written += write_delimiter(writer, ItemDelimitationItem, 0)?;
      }
      written += write_delimiter(writer, SequenceDelimitationItem, 0)?;
      Ok(written)
    },
  }
}

fn write_element<W: Write>(writer: &mut W, element: &DataElement, syntax: Syntax, options: &EncodeOptions)
  -> Result<usize, DicomError> {
  check_element(element, syntax)?;
  if options.strict_lengths {
    element.check_length()?;
  }
  match &element.value {
    Value::Sequence(items) => write_sequence(writer, element, items, syntax, options),
    _ => {
      let data = element.padded_bytes()
        .ok_or_else(|| DicomError::schema(element.tag, "no value bytes"))?;
      let header = write_header(writer, element, data.len() as u32, syntax)?;
      writer.write_all(&data)?;
      Ok(header + data.len())
    },
  }
}

fn write_data_set<W: Write>(writer: &mut W, data_set: &DataSet, syntax: Syntax, options: &EncodeOptions)
  -> Result<usize, DicomError> {
  let mut written = 0;
  for element in data_set {
    written += write_element(writer, element, syntax, options)?;
  }
  Ok(written)
}

/// Writes a complete file and returns the number of bytes written. Any
/// FileMetaInformationGroupLength in `meta` is replaced by the computed one.
pub fn write_file<W: Write>(writer: &mut W, meta: &DataSet, data_set: &DataSet, options: &EncodeOptions)
  -> Result<usize, DicomError> {
  let mut meta_buffer: Vec<u8> = vec![];
  for element in meta.iter().filter(|e| e.tag != FileMetaInformationGroupLength) {
    write_element(&mut meta_buffer, element, Syntax::ExplicitLittle, options)?;
  }
  // Encode the data set before anything hits the writer so a schema error
  // leaves nothing behind.
  let mut data_set_buffer: Vec<u8> = vec![];
  write_data_set(&mut data_set_buffer, data_set, Syntax::ImplicitLittle, options)?;

  writer.write_all(&[0; PREAMBLE_LENGTH])?;
  writer.write_all(MAGIC)?;
  let group_length = DataElement::new(
    FileMetaInformationGroupLength,
    ValueRepresentation::UL,
    Value::UnsignedLong(meta_buffer.len() as u32),
  );
  let mut written = PREAMBLE_LENGTH + MAGIC.len();
  written += write_element(writer, &group_length, Syntax::ExplicitLittle, options)?;
  writer.write_all(&meta_buffer)?;
  writer.write_all(&data_set_buffer)?;
  writer.flush()?;
  Ok(written + meta_buffer.len() + data_set_buffer.len())
}

pub fn encode_with(meta: &DataSet, data_set: &DataSet, options: &EncodeOptions) -> Result<Vec<u8>, DicomError> {
  let mut buffer: Vec<u8> = vec![];
  write_file(&mut buffer, meta, data_set, options)?;
  Ok(buffer)
}

/// Encodes with defined length sequences.
pub fn encode(meta: &DataSet, data_set: &DataSet) -> Result<Vec<u8>, DicomError> {
  encode_with(meta, data_set, &EncodeOptions::default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dicom_tags::*;
  use crate::meta::build_meta;

  fn u16_at(buffer: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buffer[offset], buffer[offset + 1]])
  }

  fn u32_at(buffer: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buffer[offset..offset + 4].try_into().unwrap())
  }

  fn small_data_set() -> DataSet {
    let mut step = DataSet::new();
    step.put_text(Modality, ValueRepresentation::CS, "CR");
    step.put_text(ScheduledProcedureStepID, ValueRepresentation::SH, "A1_SPS");
    let mut data_set = DataSet::new();
    data_set.put_text(PatientName, ValueRepresentation::PN, "DOE^JON");
    data_set.put_text(AccessionNumber, ValueRepresentation::SH, "A1");
    data_set.put(DataElement::sequence(ScheduledProcedureStepSequence, vec![step]));
    data_set
  }

  #[test]
  fn preamble_magic_and_meta_group_length() {
    let buffer = encode(&build_meta("1.2.3"), &DataSet::new()).unwrap();
    assert!(buffer[..PREAMBLE_LENGTH].iter().all(|b| *b == 0));
    assert_eq!(&buffer[PREAMBLE_LENGTH..PREAMBLE_LENGTH + 4], b"DICM");
    // (0002,0000) UL, 2 bytes length, 4 bytes value
    let offset = PREAMBLE_LENGTH + 4;
    assert_eq!(&buffer[offset..offset + 6], &[0x02, 0x00, 0x00, 0x00, b'U', b'L']);
    assert_eq!(u16_at(&buffer, offset + 6), 4);
    let group_length = u32_at(&buffer, offset + 8) as usize;
    // Nothing follows the meta group since the data set is empty.
    assert_eq!(buffer.len(), offset + 12 + group_length);
  }

  #[test]
  fn meta_uses_explicit_vr_and_long_form_for_ob() {
    let buffer = encode(&build_meta("1.2.3"), &DataSet::new()).unwrap();
    let offset = PREAMBLE_LENGTH + 4 + 12;
    // (0002,0001) OB, 2 reserved bytes, 4 bytes length, 00 01
    assert_eq!(&buffer[offset..offset + 6], &[0x02, 0x00, 0x01, 0x00, b'O', b'B']);
    assert_eq!(&buffer[offset + 6..offset + 8], &[0, 0]);
    assert_eq!(u32_at(&buffer, offset + 8), 2);
    assert_eq!(&buffer[offset + 12..offset + 14], &[0x00, 0x01]);
    // (0002,0002) UI
    let offset = offset + 14;
    assert_eq!(&buffer[offset + 4..offset + 6], b"UI");
    assert_eq!(u16_at(&buffer, offset + 6), 22);
    assert_eq!(&buffer[offset + 8..offset + 30], b"1.2.840.10008.5.1.4.31");
  }

  #[test]
  fn data_set_is_implicit_vr_with_defined_length_sequence() {
    let meta = build_meta("1.2.3");
    let buffer = encode(&meta, &small_data_set()).unwrap();
    let meta_length = u32_at(&buffer, PREAMBLE_LENGTH + 4 + 8) as usize;
    let mut offset = PREAMBLE_LENGTH + 4 + 12 + meta_length;

    // (0008,0050) SH "A1", no VR on the wire
    assert_eq!(&buffer[offset..offset + 4], &[0x08, 0x00, 0x50, 0x00]);
    assert_eq!(u32_at(&buffer, offset + 4), 2);
    assert_eq!(&buffer[offset + 8..offset + 10], b"A1");
    offset += 10;

    // (0010,0010) PN padded with a space
    assert_eq!(&buffer[offset..offset + 4], &[0x10, 0x00, 0x10, 0x00]);
    assert_eq!(u32_at(&buffer, offset + 4), 8);
    assert_eq!(&buffer[offset + 8..offset + 16], b"DOE^JON ");
    offset += 16;

    // (0040,0100) SQ, item of 8 + 2 + 8 + 6 bytes
    assert_eq!(&buffer[offset..offset + 4], &[0x40, 0x00, 0x00, 0x01]);
    assert_eq!(u32_at(&buffer, offset + 4), 8 + 24);
    assert_eq!(&buffer[offset + 8..offset + 12], &[0xFE, 0xFF, 0x00, 0xE0]);
    assert_eq!(u32_at(&buffer, offset + 12), 24);
    assert_eq!(&buffer[offset + 16..offset + 20], &[0x08, 0x00, 0x60, 0x00]);
    assert_eq!(buffer.len(), offset + 8 + 32);
  }

  #[test]
  fn undefined_length_sequence_uses_delimiters() {
    let options = EncodeOptions { sequence_length: SequenceLength::Undefined, ..Default::default() };
    let buffer = encode_with(&build_meta("1.2.3"), &small_data_set(), &options).unwrap();
    let tail = &buffer[buffer.len() - 16..];
    assert_eq!(&tail[..8], &[0xFE, 0xFF, 0x0D, 0xE0, 0, 0, 0, 0]);
    assert_eq!(&tail[8..], &[0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]);
    let defined = encode(&build_meta("1.2.3"), &small_data_set()).unwrap();
    assert_eq!(buffer.len(), defined.len() + 16);
  }

  #[test]
  fn encoding_is_deterministic() {
    let meta = build_meta("1.2.3");
    let data_set = small_data_set();
    assert_eq!(encode(&meta, &data_set).unwrap(), encode(&meta, &data_set).unwrap());
  }

  #[test]
  fn unknown_tag_is_a_schema_error() {
    let mut data_set = small_data_set();
    data_set.put_text(Tag::new(0x0009, 0x1001), ValueRepresentation::LO, "private");
    match encode(&build_meta("1.2.3"), &data_set) {
      Err(DicomError::Schema { tag, .. }) => assert_eq!(tag, Tag::new(0x0009, 0x1001)),
      other => panic!("expected a schema error, got {:?}", other),
    }
  }

  #[test]
  fn mismatched_vr_and_value_are_schema_errors() {
    let mut data_set = DataSet::new();
    data_set.put_text(PatientName, ValueRepresentation::LO, "DOE");
    assert!(matches!(encode(&build_meta("1.2.3"), &data_set), Err(DicomError::Schema { .. })));

    let mut data_set = DataSet::new();
    data_set.put(DataElement::new(PatientName, ValueRepresentation::PN, Value::UnsignedLong(3)));
    assert!(matches!(encode(&build_meta("1.2.3"), &data_set), Err(DicomError::Schema { .. })));

    let mut data_set = DataSet::new();
    data_set.put_text(TransferSyntaxUID, ValueRepresentation::UI, "1.2.840.10008.1.2");
    assert!(matches!(encode(&build_meta("1.2.3"), &data_set), Err(DicomError::Schema { .. })));
  }

  #[test]
  fn schema_error_in_nested_item_is_reported() {
    let mut step = DataSet::new();
    step.put_text(Tag::new(0x0041, 0x0001), ValueRepresentation::LO, "x");
    let mut data_set = DataSet::new();
    data_set.put(DataElement::sequence(ScheduledProcedureStepSequence, vec![step]));
    match encode(&build_meta("1.2.3"), &data_set) {
      Err(DicomError::Schema { tag, .. }) => assert_eq!(tag, Tag::new(0x0041, 0x0001)),
      other => panic!("expected a schema error, got {:?}", other),
    }
  }

  #[test]
  fn strict_lengths() {
    let mut data_set = DataSet::new();
    data_set.put_text(AccessionNumber, ValueRepresentation::SH, "ACCESSION-NUMBER-TOO-LONG");
    assert!(encode(&build_meta("1.2.3"), &data_set).is_ok());
    let options = EncodeOptions { strict_lengths: true, ..Default::default() };
    assert!(matches!(
      encode_with(&build_meta("1.2.3"), &data_set, &options),
      Err(DicomError::ValueTooLong { .. })
    ));
  }

  #[test]
  fn written_size_matches_buffer() {
    let mut buffer: Vec<u8> = vec![];
    let written = write_file(&mut buffer, &build_meta("1.2.3"), &small_data_set(), &EncodeOptions::default()).unwrap();
    assert_eq!(written, buffer.len());
  }
}
