// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Addressing outlets by number or by name.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// An outlet addressed either by its number or by its description.
///
/// Strings made only of ASCII digits are numbers; anything else is a name.
///
/// # Examples
///
/// ```
/// use dlipower_lib::types::OutletSelector;
///
/// assert_eq!("3".parse::<OutletSelector>().unwrap(), OutletSelector::Number(3));
/// assert_eq!(
///     "Router".parse::<OutletSelector>().unwrap(),
///     OutletSelector::Name("Router".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutletSelector {
    /// A 1-based outlet number.
    Number(u32),
    /// An outlet description, matched case-insensitively.
    Name(String),
}

impl From<u32> for OutletSelector {
    fn from(number: u32) -> Self {
        Self::Number(number)
    }
}

/// Digit strings become numbers, like [`FromStr`]. Outlet `0` and numbers
/// past `u32::MAX` are kept as numbers so lookup reports them out of range.
impl From<&str> for OutletSelector {
    fn from(name: &str) -> Self {
        match digits(name) {
            Some(digits) => Self::Number(digits.parse().unwrap_or(u32::MAX)),
            None => Self::Name(name.to_string()),
        }
    }
}

impl From<String> for OutletSelector {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl FromStr for OutletSelector {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(digits) = digits(s) {
            let number: u32 = digits
                .parse()
                .map_err(|_| ValueError::InvalidOutletNumber(s.to_string()))?;
            if number == 0 {
                return Err(ValueError::InvalidOutletNumber(s.to_string()));
            }
            Ok(Self::Number(number))
        } else {
            Ok(Self::Name(s.to_string()))
        }
    }
}

impl fmt::Display for OutletSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Returns the trimmed text if it is a non-empty run of ASCII digits.
fn digits(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit())).then_some(trimmed)
}

/// Widest span a single range item may cover.
const MAX_RANGE_SPAN: u32 = 1024;

/// Expands an outlet range expression into selectors.
///
/// Comma-separated items are either a single outlet (`5`, `Router`) or an
/// inclusive numeric range (`1-3`). Several arguments may be passed; they
/// are joined with commas first.
///
/// # Errors
///
/// Returns [`ValueError::InvalidRange`] for empty items, descending ranges
/// and spans wider than 1024 outlets, and
/// [`ValueError::InvalidOutletNumber`] for outlet 0.
///
/// # Examples
///
/// ```
/// use dlipower_lib::types::{OutletSelector, parse_outlet_range};
///
/// let outlets = parse_outlet_range(&["1-3,7", "Router"]).unwrap();
/// assert_eq!(outlets.len(), 5);
/// assert_eq!(outlets[4], OutletSelector::Name("Router".to_string()));
/// ```
pub fn parse_outlet_range<S: AsRef<str>>(args: &[S]) -> Result<Vec<OutletSelector>, ValueError> {
    let joined = args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
    let mut selectors = Vec::new();

    for item in joined.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(ValueError::InvalidRange(joined.clone()));
        }

        if let Some((start, end)) = item.split_once('-')
            && let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
        {
            if start == 0 {
                return Err(ValueError::InvalidOutletNumber(item.to_string()));
            }
            if start > end || end - start > MAX_RANGE_SPAN {
                return Err(ValueError::InvalidRange(item.to_string()));
            }
            selectors.extend((start..=end).map(OutletSelector::Number));
            continue;
        }

        selectors.push(item.parse()?);
    }

    Ok(selectors)
}
