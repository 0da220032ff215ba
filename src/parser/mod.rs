// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status page parsing.
//!
//! The switch has no machine-readable API: outlet numbers, names and states
//! are read from the HTML table of its status page. Firmware generations
//! lay that table out differently, so each known layout is a
//! [`TableLayout`] variant, chosen by looking at the table's structure.
//!
//! | Layout | Recognised by | Columns |
//! |--------|---------------|---------|
//! | [`TableLayout::Admin`] | header-less rows of five cells, first cell `1` | number, name, state, switch, cycle |
//! | [`TableLayout::User`] | header row starting with `#` | number, name, state, ... |
//! | [`TableLayout::NameFirst`] | header row ending with `#` | name, state, number |
//!
//! A page without any of these tables is a [`ParseError`], never an empty
//! collection: zero outlets and an unreadable page are different answers.

mod markup;

use std::collections::HashSet;

use crate::error::ParseError;
use crate::types::{Outlet, OutletCollection, PowerState};

use markup::{Row, Table};

/// The outlet table layouts emitted by known firmware versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Administrator view of WebPowerSwitch II-IV firmware.
    Admin,
    /// Restricted user view, with a `#` header column.
    User,
    /// Later firmware listing the outlet number last.
    NameFirst,
}

impl TableLayout {
    const ADMIN_WIDTH: usize = 5;

    /// Determines the layout of a table, if it is an outlet table.
    fn sniff(table: &Table) -> Option<Self> {
        if let Some(header) = table.header() {
            let first = header.text(0);
            let last = header.cells.last().map_or("", |cell| cell.text.as_str());
            if header.cells.len() >= 3 && first == "#" {
                return Some(Self::User);
            }
            if header.cells.len() >= 3 && last == "#" {
                return Some(Self::NameFirst);
            }
            return None;
        }

        table
            .rows
            .iter()
            .any(|row| row.is_data() && row.cells.len() == Self::ADMIN_WIDTH && row.text(0) == "1")
            .then_some(Self::Admin)
    }

    /// Returns the (number, name, state) column indices for a row.
    fn columns(self, row: &Row) -> (usize, usize, usize) {
        match self {
            Self::Admin | Self::User => (0, 1, 2),
            Self::NameFirst => (row.cells.len().saturating_sub(1), 0, 1),
        }
    }

    /// Returns true if the row describes an outlet.
    ///
    /// `in_body` is set once an outlet row has been read. Admin rows whose
    /// first cell is a number must be complete, and a full-width row inside
    /// the outlet block must carry a number.
    fn is_outlet_row(self, index: usize, row: &Row, in_body: bool) -> Result<bool, ParseError> {
        if !row.is_data() {
            return Ok(false);
        }
        match self {
            Self::Admin => {
                let first = row.text(0);
                let numbered = !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit());
                if numbered && row.cells.len() != Self::ADMIN_WIDTH {
                    return Err(ParseError::MissingCell {
                        row: index,
                        found: row.cells.len(),
                        expected: Self::ADMIN_WIDTH,
                    });
                }
                if !numbered && in_body && row.cells.len() == Self::ADMIN_WIDTH {
                    return Err(ParseError::InvalidOutletNumber(first.to_string()));
                }
                Ok(numbered)
            }
            // Single-cell rows are spacers or footers spanning the table.
            Self::User | Self::NameFirst => Ok(row.cells.len() > 1),
        }
    }

    fn parse_rows(self, table: &Table) -> Result<OutletCollection, ParseError> {
        let mut seen = HashSet::new();
        let mut outlets = Vec::new();

        for (index, row) in table.rows.iter().enumerate() {
            if !self.is_outlet_row(index, row, !outlets.is_empty())? {
                continue;
            }
            if row.cells.len() < 3 {
                return Err(ParseError::MissingCell {
                    row: index,
                    found: row.cells.len(),
                    expected: 3,
                });
            }

            let (number_col, name_col, state_col) = self.columns(row);
            let number_text = row.text(number_col);
            let number = number_text
                .parse::<u32>()
                .ok()
                .filter(|&number| number > 0)
                .ok_or_else(|| ParseError::InvalidOutletNumber(number_text.to_string()))?;

            let state_text = row.text(state_col);
            let state = state_text
                .parse::<PowerState>()
                .map_err(|_| ParseError::InvalidState {
                    outlet: number,
                    text: state_text.to_string(),
                })?;

            if !seen.insert(number) {
                return Err(ParseError::DuplicateOutlet(number));
            }
            outlets.push(Outlet::new(number, row.text(name_col), state));
        }

        let outlets = OutletCollection::new(outlets);
        // The admin view lists every port of the unit.
        if self == Self::Admin
            && let Some(missing) = (1..).zip(outlets.iter()).find_map(|(expected, outlet)| {
                (outlet.number() != expected).then_some(expected)
            })
        {
            return Err(ParseError::MissingOutlet(missing));
        }
        Ok(outlets)
    }
}

/// Parses a status page into its outlet table.
///
/// # Errors
///
/// - [`ParseError::UnrecognizedLayout`] if no table matches a known layout
/// - [`ParseError::Truncated`] if the outlet table is not closed
/// - [`ParseError::InvalidState`] if a state is neither ON nor OFF
/// - [`ParseError::InvalidOutletNumber`], [`ParseError::DuplicateOutlet`],
///   [`ParseError::MissingCell`] for malformed rows
/// - [`ParseError::MissingOutlet`] if the admin table skips an outlet number
///
/// # Examples
///
/// ```
/// use dlipower_lib::parser::parse_outlet_table;
/// use dlipower_lib::types::PowerState;
///
/// let html = "<table>\
///     <tr><th>#</th><th>Name</th><th>State</th></tr>\
///     <tr><td>1</td><td>Router</td><td><font color=green>ON</font></td></tr>\
///     </table>";
///
/// let outlets = parse_outlet_table(html).unwrap();
/// assert_eq!(outlets.len(), 1);
/// assert_eq!(outlets[0].state(), PowerState::On);
/// ```
pub fn parse_outlet_table(html: &str) -> Result<OutletCollection, ParseError> {
    parse_with_layout(html).map(|(_, outlets)| outlets)
}

/// Parses a status page, also reporting which layout was recognised.
///
/// # Errors
///
/// Same as [`parse_outlet_table`].
pub fn parse_with_layout(html: &str) -> Result<(TableLayout, OutletCollection), ParseError> {
    let tables = markup::extract_tables(html);

    let Some((layout, table)) = tables
        .iter()
        .find_map(|table| TableLayout::sniff(table).map(|layout| (layout, table)))
    else {
        return Err(ParseError::UnrecognizedLayout);
    };

    if !table.closed {
        return Err(ParseError::Truncated);
    }

    let outlets = layout.parse_rows(table)?;
    tracing::debug!(?layout, outlets = outlets.len(), "Parsed outlet table");
    Ok((layout, outlets))
}
