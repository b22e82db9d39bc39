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

//! Conversion of loosely formatted scheduling input into DICOM DA and TM
//! strings. Unparseable input silently falls back to the current date or
//! time.

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::debug;

// Tried in this order, first success wins.
// (pattern, separator, index of the year component)
const DATE_PATTERNS: [(&str, char, usize); 4] = [
  ("%Y-%m-%d", '-', 0),
  ("%Y/%m/%d", '/', 0),
  ("%d-%m-%Y", '-', 2),
  ("%d/%m/%Y", '/', 2),
];

pub fn format_date(input: Option<&str>) -> String {
  format_date_at(input, Local::now().naive_local())
}

pub fn format_date_at(input: Option<&str>, now: NaiveDateTime) -> String {
  let input = input.unwrap_or("");
  if !input.is_empty() {
    for (pattern, separator, year_index) in DATE_PATTERNS.iter() {
      if let Some(date) = parse_date(input, pattern, *separator, *year_index) {
        return date.format("%Y%m%d").to_string();
      }
    }
    debug!("unrecognized date {:?}, using the current date", input);
  }
  now.format("%Y%m%d").to_string()
}

fn parse_date(input: &str, pattern: &str, separator: char, year_index: usize) -> Option<NaiveDate> {
  // chrono accepts years of any width (and a sign), only 4 digits years are
  // meant here.
  let components: Vec<&str> = input.split(separator).collect();
  if components.len() != 3 {
    return None;
  }
  let year = components[year_index];
  if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
    return None;
  }
  NaiveDate::parse_from_str(input, pattern).ok()
}

pub fn format_time(input: Option<&str>) -> String {
  format_time_at(input, Local::now().naive_local())
}

pub fn format_time_at(input: Option<&str>, now: NaiveDateTime) -> String {
  let stripped: String = input.unwrap_or("").chars().filter(|c| *c != ':').collect();
  match stripped.chars().count() {
    4 => stripped + "00",
    6 => stripped,
    _ => {
      debug!("unrecognized time {:?}, using the current time", input);
      now.format("%H%M%S").to_string()
    },
  }
}

/// Turns "First Middle Last" into the PN form "Last^First Middle". Names
/// already containing a component separator are left alone.
pub fn format_person_name(input: &str) -> String {
  if input.contains('^') {
    return input.to_string();
  }
  let mut parts: Vec<&str> = input.split_whitespace().collect();
  match parts.len() {
    0 => String::new(),
    1 => format!("{}^", parts[0]),
    _ => {
      let last = parts.pop().unwrap_or_default();
      format!("{}^{}", last, parts.join(" "))
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(12, 34, 56).unwrap()
  }

  #[test]
  fn all_date_patterns_give_the_same_date() {
    for input in ["2024-03-07", "2024/03/07", "07-03-2024", "07/03/2024"] {
      assert_eq!(format_date_at(Some(input), noon()), "20240307", "{}", input);
    }
  }

  #[test]
  fn single_digit_day_and_month() {
    assert_eq!(format_date_at(Some("2024-3-7"), noon()), "20240307");
    assert_eq!(format_date_at(Some("7/3/2024"), noon()), "20240307");
  }

  #[test]
  fn bad_dates_fall_back_to_today() {
    assert_eq!(format_date_at(Some(""), noon()), "20261019");
    assert_eq!(format_date_at(None, noon()), "20261019");
    assert_eq!(format_date_at(Some("not-a-date"), noon()), "20261019");
    assert_eq!(format_date_at(Some("2024-02-30"), noon()), "20261019");
    assert_eq!(format_date_at(Some("24-03-07"), noon()), "20261019");
    assert_eq!(format_date_at(Some("20240307"), noon()), "20261019");
  }

  #[test]
  fn wall_clock_date_fallback() {
    let today = Local::now().format("%Y%m%d").to_string();
    let result = format_date(Some("not-a-date"));
    assert_eq!(result.len(), 8);
    assert!(result.chars().all(|c| c.is_ascii_digit()));
    // Midnight may pass between the two calls.
    if result != today {
      assert_eq!(result, Local::now().format("%Y%m%d").to_string());
    }
  }

  #[test]
  fn times() {
    assert_eq!(format_time_at(Some("14:30"), noon()), "143000");
    assert_eq!(format_time_at(Some("143045"), noon()), "143045");
    assert_eq!(format_time_at(Some("14:30:45"), noon()), "143045");
    assert_eq!(format_time_at(Some("99:99"), noon()), "999900");
    assert_eq!(format_time_at(Some("99"), noon()), "123456");
    assert_eq!(format_time_at(Some(""), noon()), "123456");
    assert_eq!(format_time_at(None, noon()), "123456");
  }

  #[test]
  fn wall_clock_time_fallback() {
    let result = format_time(Some("99"));
    assert_eq!(result.len(), 6);
    assert!(result.chars().all(|c| c.is_ascii_digit()));
  }

  #[test]
  fn person_names() {
    assert_eq!(format_person_name("DOE^JOHN"), "DOE^JOHN");
    assert_eq!(format_person_name("John Doe"), "Doe^John");
    assert_eq!(format_person_name("John Michael Doe"), "Doe^John Michael");
    assert_eq!(format_person_name("Cher"), "Cher^");
    assert_eq!(format_person_name("  "), "");
  }
}
