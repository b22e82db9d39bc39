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

use log::debug;
use uuid::Uuid;

// UUID derived UIDs, see
// https://dicom.nema.org/medical/dicom/current/output/chtml/part05/sect_B.2.html
const UUID_ROOT: &str = "2.25";

pub const MAX_UID_LENGTH: usize = 64;

/// A fresh UID. The random v4 UUID makes collisions practically impossible,
/// across processes as well as within one.
pub fn generate_uid() -> String {
  let uid = format!("{}.{}", UUID_ROOT, Uuid::new_v4().as_u128());
  debug!("generated UID {}", uid);
  uid
}

/// Digits and dots only, no empty component, no leading zero except for a
/// component that is "0", at most 64 characters.
pub fn is_valid_uid(uid: &str) -> bool {
  if uid.is_empty() || uid.len() > MAX_UID_LENGTH {
    return false;
  }
  uid.split('.').all(|component| {
    !component.is_empty()
      && component.chars().all(|c| c.is_ascii_digit())
      && (component == "0" || !component.starts_with('0'))
  })
}
