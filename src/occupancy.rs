use crate::time::SlotKey;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether an occupant is the schedule's organizer or a later arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    Organizer,
    Participant,
}

/// One person available in one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Occupant {
    pub name: String,
    pub role: Role,
}

/// Everyone available in one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotOccupancy {
    occupants: Vec<Occupant>,
}

impl SlotOccupancy {
    /// The cell's occupants, organizer first, then participants in
    /// schedule-arrival order. Aggregation owns that ordering; it is
    /// read-only here.
    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    /// Admits a person to the cell unless they are already in it.
    ///
    /// Cell occupancy is a membership, not a tally: one person's slot list
    /// can reach the same cell twice (a duplicated record, or two distinct
    /// readings that coincide across a fall-back fold) and still counts
    /// once.
    pub(crate) fn push_occupant(&mut self, name: &str, role: Role) {
        if self.occupants.iter().any(|occupant| occupant.name == name) {
            return;
        }
        self.occupants.push(Occupant {
            name: name.to_string(),
            role,
        });
    }

    pub fn count(&self) -> usize {
        self.occupants.len()
    }

    pub fn has_organizer(&self) -> bool {
        self.occupants
            .iter()
            .any(|occupant| occupant.role == Role::Organizer)
    }

    /// Tooltip line for the cell: occupant names joined with `, `.
    pub fn names(&self) -> String {
        self.occupants
            .iter()
            .map(|occupant| occupant.name.as_str())
            .join(", ")
    }

    /// Highlight intensity for the cell, ramping with occupant count and
    /// capped so text stays readable: `min(0.2 + 0.2 * count, 0.8)`.
    pub fn highlight_weight(&self) -> f32 {
        (0.2 + 0.2 * self.count() as f32).min(0.8)
    }
}

/// Aggregation result: every *occupied* grid cell, keyed by its projection
/// key in the requested display timezone. Cells absent from the map are
/// empty; `WeekWindow::keys` enumerates the full grid for rendering.
pub type SlotOccupancyMap = BTreeMap<SlotKey, SlotOccupancy>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admitting_the_same_name_twice_keeps_one_entry() {
        let mut cell = SlotOccupancy::default();
        cell.push_occupant("Ana", Role::Participant);
        cell.push_occupant("Ana", Role::Participant);
        cell.push_occupant("Ben", Role::Participant);

        assert_eq!(cell.count(), 2);
        assert_eq!(cell.names(), "Ana, Ben");
    }

    #[test]
    fn highlight_weight_ramps_and_caps() {
        let mut cell = SlotOccupancy::default();
        assert_eq!(cell.highlight_weight(), 0.2);

        for name in ["Ana", "Ben", "Chen", "Dai"] {
            cell.push_occupant(name, Role::Participant);
        }

        assert_eq!(cell.highlight_weight(), 0.8);
    }
}
