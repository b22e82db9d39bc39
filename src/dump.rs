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

//! A dcmdump like listing of a worklist file.

use std::fmt::Write;

use crate::data_set::{DataElement, DataSet, Value};
use crate::dicom_tags::{self, Item, ItemDelimitationItem, SequenceDelimitationItem};
use crate::instance::Instance;
use crate::tags::Tag;

struct Line {
  tag: Tag,
  vr: String,
  value: String,
  length: usize,
  multiplicity: usize,
  name: &'static str,
  level: usize,
}

/// Length of the value as a defined length encoding would write it.
fn value_length(element: &DataElement) -> usize {
  match &element.value {
    Value::Sequence(items) => items.iter().map(|item| 8 + data_set_length(item)).sum(),
    _ => element.padded_bytes().map(|bytes| bytes.len()).unwrap_or(0),
  }
}

fn data_set_length(data_set: &DataSet) -> usize {
  data_set.iter().map(|element| 8 + value_length(element)).sum()
}

fn display_value(element: &DataElement) -> (String, usize) {
  let (mut display_value, multiplicity) = match &element.value {
    Value::Text(value) if value.is_empty() => return ("(no value available)".to_string(), 0),
    Value::Text(value) => (format!("[{}]", value), value.matches('\\').count() + 1),
    Value::UnsignedLong(value) => (format!("{}", value), 1),
    Value::Bytes(value) => (
      value.iter().map(|b| format!("{:02x}", b)).collect::<Vec<String>>().join("\\"),
      1,
    ),
    Value::Sequence(items) => (format!("(Sequence with explicit length #={})", items.len()), 1),
  };
  if display_value.len() > 66 {
    display_value.truncate(66);
    display_value.push_str("...");
  }
  (display_value, multiplicity)
}

fn get_tag_sequence(element: &DataElement, level: usize) -> Vec<Line> {
  let (value, multiplicity) = display_value(element);
  let mut result = vec![Line {
    tag: element.tag,
    vr: element.vr.to_string(),
    value,
    length: value_length(element),
    multiplicity,
    name: dicom_tags::name_of(element.tag),
    level,
  }];
  if let Some(items) = element.items() {
    for item in items {
      result.push(Line {
        tag: Item,
        vr: "na".to_string(),
        value: format!("(Item with explicit length #={})", item.len()),
        length: data_set_length(item),
        multiplicity: 1,
        name: "Item",
        level: level + 1,
      });
      for subelement in item {
        result.append(&mut get_tag_sequence(subelement, level + 2));
      }
      result.push(Line {
        tag: ItemDelimitationItem,
        vr: "na".to_string(),
        value: "(ItemDelimitationItem for re-encoding)".to_string(),
        length: 0,
        multiplicity: 0,
        name: "ItemDelimitationItem",
        level: level + 1,
      });
    }
    result.push(Line {
      tag: SequenceDelimitationItem,
      vr: "na".to_string(),
      value: "(SequenceDelimitationItem for re-encod.)".to_string(),
      length: 0,
      multiplicity: 0,
      name: "SequenceDelimitationItem",
      level,
    });
  }
  result
}

fn write_lines(output: &mut String, data_set: &DataSet) {
  for element in data_set {
    for line in get_tag_sequence(element, 0) {
      // Writing to a String cannot fail.
      let _ = writeln!(output, "{}{} {} {: <40} # {: >3},{: >2} {}",
        " ".repeat(line.level), line.tag, line.vr, line.value, line.length, line.multiplicity, line.name);
    }
  }
}

pub fn dump(instance: &Instance) -> String {
  let mut output = String::new();
  output.push_str("\n# Dicom-File-Format\n\n");
  output.push_str("# Dicom-Meta-Information-Header\n");
  output.push_str("# Used TransferSyntax: Little Endian Explicit\n");
  write_lines(&mut output, &instance.meta);
  output.push_str("\n# Dicom-Data-Set\n");
  output.push_str("# Used TransferSyntax: Little Endian Implicit\n");
  write_lines(&mut output, &instance.data_set);
  output
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data_set::ValueRepresentation;
  use crate::dicom_tags::*;

  #[test]
  fn dump_lists_meta_and_nested_items() {
    let mut step = DataSet::new();
    step.put_text(Modality, ValueRepresentation::CS, "CR");
    let mut data_set = DataSet::new();
    data_set.put_text(AccessionNumber, ValueRepresentation::SH, "ACC1");
    data_set.put_text(StudyDescription, ValueRepresentation::LO, "");
    data_set.put(DataElement::sequence(ScheduledProcedureStepSequence, vec![step]));
    let mut meta = DataSet::new();
    meta.put_text(TransferSyntaxUID, ValueRepresentation::UI, "1.2.840.10008.1.2");
    let output = dump(&Instance { meta, data_set });

    assert!(output.contains("# Dicom-Meta-Information-Header"));
    assert!(output.contains("(0002,0010) UI [1.2.840.10008.1.2]"));
    assert!(output.contains("(0008,0050) SH [ACC1]"));
    assert!(output.contains("(no value available)"));
    assert!(output.contains("(0040,0100) SQ (Sequence with explicit length #=1)"));
    assert!(output.contains(" (fffe,e000) na (Item with explicit length #=1)"));
    assert!(output.contains("  (0008,0060) CS [CR]"));
    assert!(output.contains("ScheduledProcedureStepSequence"));
  }

  #[test]
  fn lengths_follow_defined_length_encoding() {
    let mut step = DataSet::new();
    step.put_text(Modality, ValueRepresentation::CS, "CR");
    let sequence = DataElement::sequence(ScheduledProcedureStepSequence, vec![step]);
    // item header + (element header + "CR")
    assert_eq!(value_length(&sequence), 8 + 8 + 2);
    let odd = DataElement::text(PatientID, ValueRepresentation::LO, "P12");
    assert_eq!(value_length(&odd), 4);
  }
}
