// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outlet snapshots.

use std::fmt;
use std::ops::Index;

use crate::error::LookupError;
use crate::types::{OutletSelector, PowerState};

/// One outlet as reported by a single status page.
///
/// Outlets are value snapshots: they are not updated by later operations,
/// and they cannot switch themselves. Route every change through
/// [`PowerSwitch`](crate::PowerSwitch) using [`Outlet::number`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlet {
    number: u32,
    description: String,
    state: PowerState,
}

impl Outlet {
    /// Creates an outlet snapshot.
    #[must_use]
    pub fn new(number: u32, description: impl Into<String>, state: PowerState) -> Self {
        Self {
            number,
            description: description.into(),
            state,
        }
    }

    /// Returns the 1-based outlet number fixed by the hardware.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns the description exactly as the firmware reported it.
    ///
    /// May be empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the power state.
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Returns the `(number, description, state)` triple.
    #[must_use]
    pub fn to_tuple(&self) -> (u32, String, PowerState) {
        (self.number, self.description.clone(), self.state)
    }
}

impl fmt::Display for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}:{}", self.number, self.state)
        } else {
            write!(f, "{}:{}", self.description, self.state)
        }
    }
}

/// Every outlet of a switch, ordered by ascending outlet number.
///
/// Position `i` holds outlet number `i + 1` on every known firmware.
///
/// # Examples
///
/// ```
/// use dlipower_lib::types::{Outlet, OutletCollection, PowerState};
///
/// let outlets = OutletCollection::new(vec![
///     Outlet::new(1, "Router", PowerState::On),
///     Outlet::new(2, "", PowerState::Off),
/// ]);
///
/// assert_eq!(outlets.len(), 2);
/// assert_eq!(outlets[0].description(), "Router");
/// assert_eq!(outlets.get_by_number(2).unwrap().state(), PowerState::Off);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutletCollection {
    outlets: Vec<Outlet>,
}

impl OutletCollection {
    /// Creates a collection, sorting the outlets by number.
    #[must_use]
    pub fn new(mut outlets: Vec<Outlet>) -> Self {
        outlets.sort_by_key(Outlet::number);
        Self { outlets }
    }

    /// Returns the number of outlets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outlets.len()
    }

    /// Returns true if the switch reported no outlets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }

    /// Returns the outlet at a 0-based position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Outlet> {
        self.outlets.get(index)
    }

    /// Returns the outlet with the given 1-based number.
    #[must_use]
    pub fn get_by_number(&self, number: u32) -> Option<&Outlet> {
        self.outlets.iter().find(|outlet| outlet.number == number)
    }

    /// Returns an iterator over the outlets in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Outlet> {
        self.outlets.iter()
    }

    /// Flattens the collection into `(number, description, state)` triples.
    #[must_use]
    pub fn to_tuples(&self) -> Vec<(u32, String, PowerState)> {
        self.outlets.iter().map(Outlet::to_tuple).collect()
    }

    /// Resolves a selector to an outlet number present in this snapshot.
    ///
    /// Names match descriptions exactly, ignoring case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// - [`LookupError::OutOfRange`] if no outlet has the given number
    /// - [`LookupError::NotFound`] if no description matches the name
    /// - [`LookupError::Ambiguous`] if several descriptions match the name
    pub fn resolve(&self, selector: &OutletSelector) -> Result<u32, LookupError> {
        match selector {
            OutletSelector::Number(number) => self
                .get_by_number(*number)
                .map(Outlet::number)
                .ok_or(LookupError::OutOfRange {
                    number: *number,
                    count: self.len(),
                }),
            OutletSelector::Name(name) => {
                let wanted = name.trim().to_lowercase();
                let matches: Vec<u32> = self
                    .outlets
                    .iter()
                    .filter(|outlet| {
                        !wanted.is_empty() && outlet.description.trim().to_lowercase() == wanted
                    })
                    .map(Outlet::number)
                    .collect();
                match matches.as_slice() {
                    [] => Err(LookupError::NotFound(name.clone())),
                    [number] => Ok(*number),
                    _ => Err(LookupError::Ambiguous {
                        name: name.clone(),
                        matches,
                    }),
                }
            }
        }
    }
}

impl Index<usize> for OutletCollection {
    type Output = Outlet;

    fn index(&self, index: usize) -> &Self::Output {
        &self.outlets[index]
    }
}

impl<'a> IntoIterator for &'a OutletCollection {
    type Item = &'a Outlet;
    type IntoIter = std::slice::Iter<'a, Outlet>;

    fn into_iter(self) -> Self::IntoIter {
        self.outlets.iter()
    }
}

impl IntoIterator for OutletCollection {
    type Item = Outlet;
    type IntoIter = std::vec::IntoIter<Outlet>;

    fn into_iter(self) -> Self::IntoIter {
        self.outlets.into_iter()
    }
}

/// Renders the status table printed by the command-line tool.
impl fmt::Display for OutletCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Outlet\t{:<15.15}\tState", "Name")?;
        for outlet in &self.outlets {
            writeln!(
                f,
                "{}\t{:<15.15}\t{}",
                outlet.number, outlet.description, outlet.state
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutletCollection {
        OutletCollection::new(vec![
            Outlet::new(2, "killer robot", PowerState::On),
            Outlet::new(1, "Tuin beregening", PowerState::Off),
            Outlet::new(3, "", PowerState::Off),
        ])
    }

    #[test]
    fn collection_is_sorted_by_number() {
        let outlets = sample();
        let numbers: Vec<u32> = outlets.iter().map(Outlet::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(outlets[1].description(), "killer robot");
    }

    #[test]
    fn get_by_number() {
        let outlets = sample();
        assert_eq!(outlets.get_by_number(3).unwrap().description(), "");
        assert!(outlets.get_by_number(4).is_none());
        assert!(outlets.get(3).is_none());
    }

    #[test]
    fn outlet_display_falls_back_to_number() {
        let outlets = sample();
        assert_eq!(outlets[0].to_string(), "Tuin beregening:OFF");
        assert_eq!(outlets[2].to_string(), "3:OFF");
    }

    #[test]
    fn status_table_truncates_names() {
        let outlets = OutletCollection::new(vec![Outlet::new(
            1,
            "A very long outlet description",
            PowerState::On,
        )]);
        assert_eq!(
            outlets.to_string(),
            "Outlet\tName           \tState\n1\tA very long out\tON\n"
        );
    }

    #[test]
    fn resolve_numbers_and_names() {
        let outlets = sample();
        for number in 1..=3 {
            assert_eq!(outlets.resolve(&OutletSelector::Number(number)), Ok(number));
        }
        assert_eq!(outlets.resolve(&"KILLER ROBOT".into()), Ok(2));
        assert_eq!(outlets.resolve(&" tuin beregening ".into()), Ok(1));
        assert_eq!(
            outlets.resolve(&OutletSelector::Number(9)),
            Err(LookupError::OutOfRange { number: 9, count: 3 })
        );
        assert_eq!(
            outlets.resolve(&"killer".into()),
            Err(LookupError::NotFound("killer".to_string()))
        );
    }

    #[test]
    fn resolve_duplicate_names_is_ambiguous() {
        let outlets = OutletCollection::new(vec![
            Outlet::new(1, "spare", PowerState::Off),
            Outlet::new(2, "Spare", PowerState::On),
        ]);
        assert_eq!(
            outlets.resolve(&"spare".into()),
            Err(LookupError::Ambiguous {
                name: "spare".to_string(),
                matches: vec![1, 2]
            })
        );
    }

    #[test]
    fn empty_name_matches_nothing() {
        let outlets = sample();
        assert!(matches!(
            outlets.resolve(&OutletSelector::Name(String::new())),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn to_tuples_flattens_in_order() {
        let tuples = sample().to_tuples();
        assert_eq!(tuples[0], (1, "Tuin beregening".to_string(), PowerState::Off));
        assert_eq!(tuples.len(), 3);
    }
}
