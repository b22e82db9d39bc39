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

use std::convert::TryFrom;
use std::fmt;

use crate::error::DicomError;

/// A data element tag. Tags sort numerically on (group, element), which is
/// the order data elements must appear in on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
  pub group: u16,
  pub element: u16,
}

impl Tag {
  pub const fn new(group: u16, element: u16) -> Tag {
    Tag { group, element }
  }

  /// Group length tags are (gggg,0000).
  pub fn is_group_length(&self) -> bool {
    self.element == 0x0000
  }

  pub fn is_file_meta(&self) -> bool {
    self.group == 0x0002
  }

  pub fn to_le_bytes(&self) -> [u8; 4] {
    let group = self.group.to_le_bytes();
    let element = self.element.to_le_bytes();
    [group[0], group[1], element[0], element[1]]
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "({:04x},{:04x})", self.group, self.element)
  }
}

impl From<u32> for Tag {
  fn from(value: u32) -> Self {
    Tag::new((value >> 16) as u16, (value & 0xFFFF) as u16)
  }
}

impl From<Tag> for u32 {
  fn from(tag: Tag) -> Self {
    ((tag.group as u32) << 16) | tag.element as u32
  }
}

// Accepts "00100010", "0010,0010" and "(0010,0010)".
impl TryFrom<&str> for Tag {
  type Error = DicomError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    let digits: String = value.chars()
      .filter(|c| !matches!(c, '(' | ')' | ','))
      .collect();
    if digits.len() != 8 {
      return Err(DicomError::Parse(format!("invalid tag: {}", value)));
    }
    let raw = u32::from_str_radix(&digits, 16)
      .map_err(|_| DicomError::Parse(format!("invalid tag: {}", value)))?;
    Ok(raw.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tags_order_by_group_then_element() {
    let mut tags = vec![
      Tag::new(0x0040, 0x0100),
      Tag::new(0x0008, 0x1030),
      Tag::new(0x0010, 0x0010),
      Tag::new(0x0008, 0x0050),
    ];
    tags.sort();
    assert_eq!(tags, vec![
      Tag::new(0x0008, 0x0050),
      Tag::new(0x0008, 0x1030),
      Tag::new(0x0010, 0x0010),
      Tag::new(0x0040, 0x0100),
    ]);
  }

  #[test]
  fn parse_and_display() {
    let tag = Tag::try_from("(0020,000D)").unwrap();
    assert_eq!(tag, Tag::new(0x0020, 0x000D));
    assert_eq!(tag.to_string(), "(0020,000d)");
    assert_eq!(Tag::try_from("0040E000").unwrap(), Tag::from(0x0040E000));
    assert!(Tag::try_from("0010").is_err());
    assert!(Tag::try_from("zz100010").is_err());
  }

  #[test]
  fn little_endian_layout() {
    assert_eq!(Tag::new(0xFFFE, 0xE000).to_le_bytes(), [0xFE, 0xFF, 0x00, 0xE0]);
  }
}
