// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal HTML table extraction.
//!
//! Walks the tags of a page and collects every `<table>` with its rows and
//! cells. Nested tables are kept apart: text inside an inner table belongs
//! to the inner table's cells only. Unclosed `<td>`/`<tr>` tags are closed
//! implicitly, as browsers do.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)\b[^>]*>").expect("valid tag regex")
});

/// One table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) header: bool,
    pub(crate) text: String,
}

/// One table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Row {
    pub(crate) cells: Vec<Cell>,
}

impl Row {
    /// Returns true if the row holds only `<th>` cells.
    pub(crate) fn is_header(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|cell| cell.header)
    }

    /// Returns true if the row holds only `<td>` cells.
    pub(crate) fn is_data(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|cell| !cell.header)
    }

    pub(crate) fn text(&self, index: usize) -> &str {
        self.cells.get(index).map_or("", |cell| cell.text.as_str())
    }
}

/// One `<table>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Table {
    pub(crate) rows: Vec<Row>,
    pub(crate) closed: bool,
    cell_open: bool,
}

impl Table {
    /// Returns the first header row, if the table has one.
    pub(crate) fn header(&self) -> Option<&Row> {
        self.rows.iter().find(|row| row.is_header())
    }

    fn open_cell(&mut self, header: bool) {
        if self.rows.is_empty() {
            self.rows.push(Row::default());
        }
        if let Some(row) = self.rows.last_mut() {
            row.cells.push(Cell {
                header,
                text: String::new(),
            });
            self.cell_open = true;
        }
    }

    fn push_text(&mut self, text: &str) {
        if !self.cell_open {
            return;
        }
        if let Some(cell) = self.rows.last_mut().and_then(|row| row.cells.last_mut()) {
            cell.text.push_str(text);
        }
    }

    fn finish(&mut self) {
        for cell in self.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
            cell.text = decode_entities(&cell.text).trim().to_string();
        }
    }
}

/// Extracts every table of a page, in document order of their start tags.
pub(crate) fn extract_tables(html: &str) -> Vec<Table> {
    let mut tables: Vec<Table> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut raw_text_until: Option<String> = None;
    let mut last_end = 0;

    for caps in TAG.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let text = &html[last_end..whole.start()];
        last_end = whole.end();

        let Some(name) = caps.get(2) else {
            // Comment.
            if raw_text_until.is_none()
                && let Some(&top) = open.last()
            {
                tables[top].push_text(text);
            }
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|slash| !slash.as_str().is_empty());

        if let Some(until) = &raw_text_until {
            if closing && *until == name {
                raw_text_until = None;
            }
            continue;
        }

        if let Some(&top) = open.last() {
            tables[top].push_text(text);
        }

        match (name.as_str(), closing) {
            ("script" | "style", false) => raw_text_until = Some(name),
            ("table", false) => {
                tables.push(Table::default());
                open.push(tables.len() - 1);
            }
            ("table", true) => {
                if let Some(top) = open.pop() {
                    tables[top].closed = true;
                    tables[top].cell_open = false;
                }
            }
            ("tr", false) => {
                if let Some(&top) = open.last() {
                    tables[top].rows.push(Row::default());
                    tables[top].cell_open = false;
                }
            }
            ("td" | "th", false) => {
                if let Some(&top) = open.last() {
                    tables[top].open_cell(name == "th");
                }
            }
            ("tr" | "td" | "th", true) => {
                if let Some(&top) = open.last() {
                    tables[top].cell_open = false;
                }
            }
            ("br", _) => {
                if let Some(&top) = open.last() {
                    tables[top].push_text(" ");
                }
            }
            _ => {}
        }
    }

    if raw_text_until.is_none()
        && let Some(&top) = open.last()
    {
        tables[top].push_text(&html[last_end..]);
    }

    for table in &mut tables {
        table.finish();
    }
    tables
}

/// Decodes the named entities the firmware emits plus numeric references.
///
/// Unknown entities are left as-is.
pub(crate) fn decode_entities(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                output.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }

    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
