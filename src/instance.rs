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

//! Reads worklist files back: File Meta Information in Explicit VR Little
//! Endian, data set in Implicit VR Little Endian. Sequences and items may use
//! defined or undefined lengths.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::str::from_utf8;

use crate::data_set::{DataElement, DataSet, Value, ValueRepresentation};
use crate::dicom_tags::{self, Item, ItemDelimitationItem, SequenceDelimitationItem, TransferSyntaxUID};
use crate::encoder::{Syntax, MAGIC, PREAMBLE_LENGTH, UNDEFINED_LENGTH};
use crate::error::DicomError;
use crate::meta::{EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN};
use crate::misc::has_dicom_header;
use crate::tags::Tag;

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
  pub meta: DataSet,
  pub data_set: DataSet,
}

struct Parser<'a> {
  buffer: &'a [u8],
}

impl<'a> Parser<'a> {
  fn slice(&self, offset: usize, length: usize) -> Result<&'a [u8], DicomError> {
    match offset.checked_add(length) {
      Some(end) if end <= self.buffer.len() => Ok(&self.buffer[offset..end]),
      _ => Err(DicomError::Parse(format!(
        "Trying to read out of file bound (offset: {}, length: {}, file size: {})",
        offset, length, self.buffer.len()))),
    }
  }

  fn read_u16(&self, offset: usize) -> Result<u16, DicomError> {
    let data = self.slice(offset, 2)?;
    Ok(u16::from_le_bytes([data[0], data[1]]))
  }

  fn read_u32(&self, offset: usize) -> Result<u32, DicomError> {
    let data = self.slice(offset, 4)?;
    Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
  }

  fn read_tag(&self, offset: usize) -> Result<Tag, DicomError> {
    Ok(Tag::new(self.read_u16(offset)?, self.read_u16(offset + 2)?))
  }

  // Finding the implicit VR means looking the tag up in the dictionary.
  // https://dicom.nema.org/medical/dicom/2017a/output/chtml/part05/chapter_A.html
  fn implicit_vr(tag: Tag) -> ValueRepresentation {
    match dicom_tags::lookup(tag) {
      Some(entry) => entry.vr,
      // So apparently, all tag with element = 0 are GenericGroupLength.
      None if tag.is_group_length() => ValueRepresentation::UL,
      None => ValueRepresentation::UN,
    }
  }

  /// Returns the element and the offset right after it.
  fn next_element(&self, offset: usize, syntax: Syntax) -> Result<(DataElement, usize), DicomError> {
    let tag = self.read_tag(offset)?;
    let mut offset = offset + 4;
    let (vr, length) = match syntax {
      Syntax::ExplicitLittle => {
        let code = self.slice(offset, 2)?;
        let vr = ValueRepresentation::from_bytes(code).ok_or_else(|| DicomError::Parse(format!(
          "unsupported VR {:?} for {} at {:#x}", String::from_utf8_lossy(code), tag, offset)))?;
        offset += 2;
        if vr.has_long_length() {
          offset += 2; // Skip reserved bytes
          let length = self.read_u32(offset)?;
          offset += 4;
          (vr, length)
        } else {
          let length = self.read_u16(offset)? as u32;
          offset += 2;
          (vr, length)
        }
      },
      Syntax::ImplicitLittle => {
        let length = self.read_u32(offset)?;
        offset += 4;
        (Parser::implicit_vr(tag), length)
      },
    };

    // Undefined length outside of SQ only happens for UN holding a sequence.
    // https://github.com/pydicom/pydicom/issues/1140
    if vr == ValueRepresentation::SQ || length == UNDEFINED_LENGTH {
      let (items, next) = self.parse_items(offset, length, syntax)?;
      return Ok((DataElement::new(tag, vr, Value::Sequence(items)), next));
    }

    let data = self.slice(offset, length as usize)?;
    let value = match vr {
      ValueRepresentation::UL => {
        if data.len() != 4 {
          return Err(DicomError::Parse(format!("{} has a UL value of {} bytes", tag, data.len())));
        }
        Value::UnsignedLong(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
      },
      ValueRepresentation::OB | ValueRepresentation::UN => Value::Bytes(data.to_vec()),
      _ => Value::Text(
        from_utf8(data)
          .map_err(|_| DicomError::Parse(format!("{} is not valid UTF8 at {:#x}", tag, offset)))?
          .trim_end_matches(|c: char| c == ' ' || c == '\0')
          .to_string()
      ),
    };
    Ok((DataElement::new(tag, vr, value), offset + length as usize))
  }

  // See http://dicom.nema.org/dicom/2013/output/chtml/part05/sect_7.5.html
  // on what a sequence looks like in a DICOM file.
  #[allow(non_upper_case_globals)]
  fn parse_items(&self, offset: usize, length: u32, syntax: Syntax) -> Result<(Vec<DataSet>, usize), DicomError> {
    let end = if length == UNDEFINED_LENGTH { None } else { Some(offset + length as usize) };
    let mut items = vec![];
    let mut offset = offset;
    loop {
      if let Some(end) = end {
        if offset >= end {
          break;
        }
      }
      let tag = self.read_tag(offset)?;
      let item_length = self.read_u32(offset + 4)?;
      offset += 8;
      match tag {
        SequenceDelimitationItem => break,
        Item => {
          let item_end = if item_length == UNDEFINED_LENGTH { None } else { Some(offset + item_length as usize) };
          let (item, next) = self.parse_data_set(offset, item_end, syntax)?;
          items.push(item);
          offset = next;
        },
        _ => return Err(DicomError::Parse(format!("unexpected {} in a sequence at {:#x}", tag, offset - 8))),
      }
    }
    Ok((items, end.unwrap_or(offset)))
  }

  /// Parses elements up to `end`, or up to an Item Delimitation Item when the
  /// end is not known.
  fn parse_data_set(&self, offset: usize, end: Option<usize>, syntax: Syntax) -> Result<(DataSet, usize), DicomError> {
    let mut data_set = DataSet::new();
    let mut offset = offset;
    loop {
      match end {
        Some(end) if offset >= end => break,
        None if offset >= self.buffer.len() =>
          return Err(DicomError::Parse("item with undefined length is not terminated".to_string())),
        _ => (),
      }
      if self.read_tag(offset)? == ItemDelimitationItem {
        offset += 8;
        break;
      }
      let (element, next) = self.next_element(offset, syntax)?;
      data_set.put(element);
      offset = next;
    }
    Ok((data_set, offset))
  }
}

fn get_transfer_syntax_uid_label(transfer_syntax_uid: &str) -> &'static str {
  match transfer_syntax_uid {
    IMPLICIT_VR_LITTLE_ENDIAN => "Implicit VR Little Endian: Default Transfer Syntax for DICOM",
    EXPLICIT_VR_LITTLE_ENDIAN => "Explicit VR Little Endian",
    "1.2.840.10008.1.2.1.99" => "Deflated Explicit VR Little Endian",
    "1.2.840.10008.1.2.2" => "Explicit VR Big Endian",
    _ => "Unknown transfer syntax uid",
  }
}

impl Instance {
  pub fn from_buf_reader<T: Read>(mut buf_reader: BufReader<T>) -> Result<Self, DicomError> {
    // Read the whole file into a buffer
    let mut buffer: Vec<u8> = vec![];
    buf_reader.read_to_end(&mut buffer)?;
    Instance::from(&buffer)
  }

  pub fn from_filepath<P: AsRef<Path>>(filepath: P) -> Result<Self, DicomError> {
    let f = File::open(filepath)?;
    Instance::from_buf_reader(BufReader::new(f))
  }

  pub fn from(buffer: &[u8]) -> Result<Self, DicomError> {
    if !has_dicom_header(buffer) {
      return Err(DicomError::Parse("Not a DICOM file".to_string()));
    }
    let parser = Parser { buffer };

    let mut meta = DataSet::new();
    let mut offset = PREAMBLE_LENGTH + MAGIC.len();
    while offset < buffer.len() && parser.read_u16(offset)? == 0x0002 {
      let (element, next) = parser.next_element(offset, Syntax::ExplicitLittle)?;
      meta.put(element);
      offset = next;
    }

    // Only the transfer syntax this crate writes is supported.
    match meta.text(TransferSyntaxUID) {
      Some(IMPLICIT_VR_LITTLE_ENDIAN) => (),
      Some(transfer_syntax_uid) => return Err(DicomError::Parse(format!(
        "Unsupported Transfer Syntax UID: {} ({})",
        transfer_syntax_uid, get_transfer_syntax_uid_label(transfer_syntax_uid)))),
      None => return Err(DicomError::Parse("Transfer Syntax UID not found".to_string())),
    }

    let (data_set, _) = parser.parse_data_set(offset, Some(buffer.len()), Syntax::ImplicitLittle)?;
    Ok(Instance { meta, data_set })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dicom_tags::*;
  use crate::encoder::{encode, encode_with, EncodeOptions, SequenceLength};
  use crate::meta::build_meta;

  fn worklist() -> DataSet {
    let mut step = DataSet::new();
    step.put_text(Modality, ValueRepresentation::CS, "MR");
    step.put_text(ScheduledProcedureStepStartTime, ValueRepresentation::TM, "143000");
    step.put_text(ScheduledStationAETitle, ValueRepresentation::AE, "ORTHANC");
    let mut data_set = DataSet::new();
    data_set.put_text(PatientName, ValueRepresentation::PN, "DOE^JON");
    data_set.put_text(StudyInstanceUID, ValueRepresentation::UI, "1.2.345");
    data_set.put(DataElement::sequence(ScheduledProcedureStepSequence, vec![step.clone(), step]));
    data_set
  }

  #[test]
  fn reads_back_defined_lengths() {
    let buffer = encode(&build_meta("1.2.3"), &worklist()).unwrap();
    let instance = Instance::from(&buffer).unwrap();
    assert_eq!(instance.data_set, worklist());
    assert_eq!(instance.meta.text(MediaStorageSOPInstanceUID), Some("1.2.3"));
  }

  #[test]
  fn reads_back_undefined_lengths() {
    let options = EncodeOptions { sequence_length: SequenceLength::Undefined, ..Default::default() };
    let buffer = encode_with(&build_meta("1.2.3"), &worklist(), &options).unwrap();
    let instance = Instance::from(&buffer).unwrap();
    assert_eq!(instance.data_set, worklist());
  }

  #[test]
  fn meta_group_length_counts_the_following_meta_bytes() {
    let buffer = encode(&build_meta("1.2.3"), &worklist()).unwrap();
    let instance = Instance::from(&buffer).unwrap();
    let group_length = match instance.meta.get(FileMetaInformationGroupLength).unwrap().value {
      Value::UnsignedLong(length) => length as usize,
      ref other => panic!("unexpected {:?}", other),
    };
    // The first data set element starts right after the meta group.
    let first = PREAMBLE_LENGTH + MAGIC.len() + 12 + group_length;
    assert_eq!(&buffer[first..first + 4], &PatientName.to_le_bytes());
  }

  #[test]
  fn rejects_non_dicom_and_other_transfer_syntaxes() {
    assert!(matches!(Instance::from(b"hello"), Err(DicomError::Parse(_))));

    let mut meta = build_meta("1.2.3");
    meta.put_text(TransferSyntaxUID, ValueRepresentation::UI, EXPLICIT_VR_LITTLE_ENDIAN);
    let buffer = encode(&meta, &DataSet::new()).unwrap();
    match Instance::from(&buffer) {
      Err(DicomError::Parse(message)) => assert!(message.contains("Explicit VR Little Endian")),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn truncated_file_is_an_error() {
    let buffer = encode(&build_meta("1.2.3"), &worklist()).unwrap();
    assert!(Instance::from(&buffer[..buffer.len() - 3]).is_err());
  }

  #[test]
  fn unknown_implicit_tags_become_un() {
    let mut buffer = encode(&build_meta("1.2.3"), &DataSet::new()).unwrap();
    buffer.extend_from_slice(&[0x09, 0x00, 0x10, 0x00, 2, 0, 0, 0, b'h', b'i']);
    let instance = Instance::from(&buffer).unwrap();
    let element = instance.data_set.get(Tag::new(0x0009, 0x0010)).unwrap();
    assert_eq!(element.vr, ValueRepresentation::UN);
    assert_eq!(element.value, Value::Bytes(b"hi".to_vec()));
  }
}
