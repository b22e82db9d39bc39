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

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DicomError;
use crate::tags::Tag;

/// The value representations the worklist schema uses, plus UN for whatever
/// the reader meets that it cannot name.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueRepresentation {
  AE, CS, DA, LO, OB, PN, SH, SQ, TM, UI, UL, UN,
}

impl ValueRepresentation {
  pub fn as_str(&self) -> &'static str {
    match self {
      ValueRepresentation::AE => "AE",
      ValueRepresentation::CS => "CS",
      ValueRepresentation::DA => "DA",
      ValueRepresentation::LO => "LO",
      ValueRepresentation::OB => "OB",
      ValueRepresentation::PN => "PN",
      ValueRepresentation::SH => "SH",
      ValueRepresentation::SQ => "SQ",
      ValueRepresentation::TM => "TM",
      ValueRepresentation::UI => "UI",
      ValueRepresentation::UL => "UL",
      ValueRepresentation::UN => "UN",
    }
  }

  pub fn from_bytes(code: &[u8]) -> Option<ValueRepresentation> {
    Some(match code {
      b"AE" => ValueRepresentation::AE,
      b"CS" => ValueRepresentation::CS,
      b"DA" => ValueRepresentation::DA,
      b"LO" => ValueRepresentation::LO,
      b"OB" => ValueRepresentation::OB,
      b"PN" => ValueRepresentation::PN,
      b"SH" => ValueRepresentation::SH,
      b"SQ" => ValueRepresentation::SQ,
      b"TM" => ValueRepresentation::TM,
      b"UI" => ValueRepresentation::UI,
      b"UL" => ValueRepresentation::UL,
      b"UN" => ValueRepresentation::UN,
      _ => return None,
    })
  }

  pub fn is_text(&self) -> bool {
    matches!(self,
      ValueRepresentation::AE |
      ValueRepresentation::CS |
      ValueRepresentation::DA |
      ValueRepresentation::LO |
      ValueRepresentation::PN |
      ValueRepresentation::SH |
      ValueRepresentation::TM |
      ValueRepresentation::UI)
  }

  /// Byte used to bring an odd length value to even length.
  // https://dicom.nema.org/dicom/2013/output/chtml/part05/sect_6.2.html
  pub fn padding(&self) -> u8 {
    match self {
      ValueRepresentation::UI |
      ValueRepresentation::OB |
      ValueRepresentation::UN => 0x00,
      _ => 0x20,
    }
  }

  /// Maximum value length in bytes, for the VRs that have one.
  pub fn max_length(&self) -> Option<usize> {
    match self {
      ValueRepresentation::AE => Some(16),
      ValueRepresentation::CS => Some(16),
      ValueRepresentation::DA => Some(8),
      ValueRepresentation::LO => Some(64),
      ValueRepresentation::PN => Some(64),
      ValueRepresentation::SH => Some(16),
      ValueRepresentation::TM => Some(16),
      ValueRepresentation::UI => Some(64),
      ValueRepresentation::UL => Some(4),
      _ => None,
    }
  }

  /// These VRs have 2 reserved bytes and a 4 bytes length in explicit VR.
  // https://dicom.nema.org/dicom/2013/output/chtml/part05/chapter_7.html#sect_7.1.2
  pub fn has_long_length(&self) -> bool {
    matches!(self, ValueRepresentation::OB | ValueRepresentation::SQ | ValueRepresentation::UN)
  }
}

impl fmt::Display for ValueRepresentation {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Text(String),
  Bytes(Vec<u8>),
  UnsignedLong(u32),
  Sequence(Vec<DataSet>),
}

impl Value {
  /// Length of the value before padding. Sequences have no raw length, their
  /// length depends on how they get encoded.
  pub fn raw_length(&self) -> Option<usize> {
    match self {
      Value::Text(text) => Some(text.len()),
      Value::Bytes(bytes) => Some(bytes.len()),
      Value::UnsignedLong(_) => Some(4),
      Value::Sequence(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
  pub tag: Tag,
  pub vr: ValueRepresentation,
  pub value: Value,
}

impl DataElement {
  pub fn new(tag: Tag, vr: ValueRepresentation, value: Value) -> DataElement {
    DataElement { tag, vr, value }
  }

  pub fn text<S: Into<String>>(tag: Tag, vr: ValueRepresentation, value: S) -> DataElement {
    DataElement::new(tag, vr, Value::Text(value.into()))
  }

  pub fn sequence(tag: Tag, items: Vec<DataSet>) -> DataElement {
    DataElement::new(tag, ValueRepresentation::SQ, Value::Sequence(items))
  }

  pub fn as_text(&self) -> Option<&str> {
    match &self.value {
      Value::Text(text) => Some(text),
      _ => None,
    }
  }

  pub fn items(&self) -> Option<&[DataSet]> {
    match &self.value {
      Value::Sequence(items) => Some(items),
      _ => None,
    }
  }

  /// The value bytes as written on the wire, padded to even length. Sequences
  /// are handled by the encoder.
  pub fn padded_bytes(&self) -> Option<Vec<u8>> {
    let mut data = match &self.value {
      Value::Text(text) => text.as_bytes().to_vec(),
      Value::Bytes(bytes) => bytes.clone(),
      Value::UnsignedLong(value) => value.to_le_bytes().to_vec(),
      Value::Sequence(_) => return None,
    };
    if data.len() % 2 != 0 {
      data.push(self.vr.padding());
    }
    Some(data)
  }

  pub fn check_length(&self) -> Result<(), DicomError> {
    match (self.vr.max_length(), self.value.raw_length()) {
      (Some(max), Some(length)) if length > max => Err(DicomError::ValueTooLong {
        tag: self.tag,
        vr: self.vr,
        length,
        max,
      }),
      _ => Ok(()),
    }
  }
}

/// Data elements keyed by tag. Iteration is always in ascending tag order,
/// whatever order the elements were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
  elements: BTreeMap<Tag, DataElement>,
}

impl DataSet {
  pub fn new() -> DataSet {
    DataSet::default()
  }

  /// Inserts the element, returning the one it replaced if any.
  pub fn put(&mut self, element: DataElement) -> Option<DataElement> {
    self.elements.insert(element.tag, element)
  }

  pub fn put_text<S: Into<String>>(&mut self, tag: Tag, vr: ValueRepresentation, value: S) {
    self.put(DataElement::text(tag, vr, value));
  }

  pub fn get(&self, tag: Tag) -> Option<&DataElement> {
    self.elements.get(&tag)
  }

  pub fn text(&self, tag: Tag) -> Option<&str> {
    self.get(tag).and_then(|element| element.as_text())
  }

  pub fn len(&self) -> usize {
    self.elements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }

  pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
    self.elements.keys().copied()
  }

  pub fn iter(&self) -> btree_map::Values<'_, Tag, DataElement> {
    self.elements.values()
  }

  /// Every element exceeding its VR maximum length, nested items included.
  pub fn overlong_elements(&self) -> Vec<DicomError> {
    let mut result = vec![];
    for element in self.iter() {
      if let Err(e) = element.check_length() {
        result.push(e);
      }
      if let Some(items) = element.items() {
        for item in items {
          result.append(&mut item.overlong_elements());
        }
      }
    }
    result
  }
}

impl<'a> IntoIterator for &'a DataSet {
  type Item = &'a DataElement;
  type IntoIter = btree_map::Values<'a, Tag, DataElement>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
