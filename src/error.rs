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

use std::error::Error;
use std::fmt;

use crate::data_set::ValueRepresentation;
use crate::tags::Tag;

#[derive(Debug)]
pub enum DicomError {
  /// A tag, VR or value the encoder has no rule for. Always a bug in the
  /// data set construction, never a user input problem.
  Schema { tag: Tag, reason: String },
  /// Only raised when strict length checking is enabled.
  ValueTooLong { tag: Tag, vr: ValueRepresentation, length: usize, max: usize },
  /// Malformed or unsupported file on read.
  Parse(String),
  NotFound(String),
  Config(String),
  Json(serde_json::Error),
  Io(std::io::Error),
}

impl DicomError {
  pub fn schema(tag: Tag, reason: &str) -> DicomError {
    DicomError::Schema { tag, reason: reason.to_string() }
  }
}

impl fmt::Display for DicomError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DicomError::Schema { tag, reason } => write!(f, "encoding schema error on {}: {}", tag, reason),
      DicomError::ValueTooLong { tag, vr, length, max } =>
        write!(f, "value of {} ({}) is {} bytes long, maximum is {}", tag, vr, length, max),
      DicomError::Parse(details) => write!(f, "{}", details),
      DicomError::NotFound(what) => write!(f, "{} not found", what),
      DicomError::Config(details) => write!(f, "configuration error: {}", details),
      DicomError::Json(err) => write!(f, "invalid JSON: {}", err),
      DicomError::Io(err) => write!(f, "{}", err),
    }
  }
}

impl Error for DicomError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      DicomError::Json(err) => Some(err),
      DicomError::Io(err) => Some(err),
      _ => None,
    }
  }
}

impl From<std::io::Error> for DicomError {
  fn from(err: std::io::Error) -> Self {
    DicomError::Io(err)
  }
}

impl From<serde_json::Error> for DicomError {
  fn from(err: serde_json::Error) -> Self {
    DicomError::Json(err)
  }
}

impl From<serde_yaml::Error> for DicomError {
  fn from(err: serde_yaml::Error) -> Self {
    DicomError::Config(err.to_string())
  }
}

impl From<std::str::Utf8Error> for DicomError {
  fn from(err: std::str::Utf8Error) -> Self {
    match err.error_len() {
      Some(l) => DicomError::Parse(format!(
        "UTF8 error: an unexpected byte was encountered at {}",
        l
      )),
      None => DicomError::Parse("UTF8 error: the end of the input was reached unexpectedly".to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn schema_error_names_the_tag() {
    let err = DicomError::schema(Tag::new(0x0009, 0x1001), "unknown tag");
    assert_eq!(err.to_string(), "encoding schema error on (0009,1001): unknown tag");
  }

  #[test]
  fn io_errors_keep_their_source() {
    let err: DicomError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
    assert!(err.source().is_some());
    assert_eq!(err.to_string(), "disk full");
  }
}
