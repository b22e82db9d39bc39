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

use std::path::Path;

use crate::encoder::{MAGIC, PREAMBLE_LENGTH};

pub fn has_dicom_header(buffer: &[u8]) -> bool {
  buffer.len() >= PREAMBLE_LENGTH + MAGIC.len()
    && &buffer[PREAMBLE_LENGTH..PREAMBLE_LENGTH + MAGIC.len()] == MAGIC
}

/**
 * Check if a file is a DICOM file.
 * Imperfect heuristic: only the magic word is looked at.
 */
pub fn is_dicom_file<P: AsRef<Path>>(file_path: P) -> bool {
  match std::fs::read(file_path) {
    Ok(buf) => has_dicom_header(&buf),
    Err(_) => false,
  }
}
