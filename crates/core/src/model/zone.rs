use std::collections::BTreeSet;

use crate::model::position::NotePosition;

/// A named set of fretboard positions.
///
/// Only valid positions are ever stored, and each at most once. Iteration is
/// ordered by string, then fret. The name is metadata: two zones with the same
/// positions compare equal regardless of their names.
///
/// `Clone` is a deep copy; hand a clone to any new owner (such as a quiz
/// session) so later edits do not leak across.
#[derive(Debug, Clone, Default)]
pub struct Zone {
    name: Option<String>,
    positions: BTreeSet<NotePosition>,
}

impl Zone {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let mut zone = Self::new();
        zone.set_name(Some(name.into()));
        zone
    }

    /// Collects positions into a zone, silently skipping invalid ones and
    /// collapsing duplicates.
    pub fn from_positions(positions: impl IntoIterator<Item = NotePosition>) -> Self {
        let mut zone = Self::new();
        zone.extend(positions);
        zone
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the name; blank names are stored as `None`.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
    }

    #[must_use]
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.set_name(name.map(str::to_string));
        self
    }

    /// Returns `false` if the position is invalid or already present.
    pub fn add(&mut self, position: NotePosition) -> bool {
        position.is_valid() && self.positions.insert(position)
    }

    /// Returns `false` if the position was not present.
    pub fn remove(&mut self, position: NotePosition) -> bool {
        self.positions.remove(&position)
    }

    #[must_use]
    pub fn contains(&self, position: NotePosition) -> bool {
        self.positions.contains(&position)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Positions ordered by (string, fret).
    pub fn positions(&self) -> impl Iterator<Item = NotePosition> + '_ {
        self.positions.iter().copied()
    }

    /// Owned copy of [`Zone::positions`].
    #[must_use]
    pub fn all_positions(&self) -> Vec<NotePosition> {
        self.positions().collect()
    }

    /// Positions on one string, ordered by fret.
    #[must_use]
    pub fn positions_on_string(&self, string: u8) -> Vec<NotePosition> {
        self.positions().filter(|p| p.string == string).collect()
    }

    /// Strings that carry at least one position, ascending.
    #[must_use]
    pub fn strings(&self) -> Vec<u8> {
        let mut strings: Vec<u8> = self.positions().map(|p| p.string).collect();
        strings.dedup();
        strings
    }

    #[must_use]
    pub fn min_fret(&self) -> Option<u8> {
        self.positions().map(|p| p.fret).min()
    }

    #[must_use]
    pub fn max_fret(&self) -> Option<u8> {
        self.positions().map(|p| p.fret).max()
    }

    /// In-place union.
    pub fn merge(&mut self, other: &Zone) {
        self.positions.extend(other.positions());
    }

    /// New zone holding positions present in both operands. Neither operand
    /// is modified; the result keeps this zone's name.
    #[must_use]
    pub fn intersection(&self, other: &Zone) -> Zone {
        Zone {
            name: self.name.clone(),
            positions: self.positions.intersection(&other.positions).copied().collect(),
        }
    }

    /// New zone holding positions present in either operand.
    #[must_use]
    pub fn union(&self, other: &Zone) -> Zone {
        let mut zone = self.clone();
        zone.merge(other);
        zone
    }

    /// New zone holding positions of this zone that are absent from `other`.
    #[must_use]
    pub fn difference(&self, other: &Zone) -> Zone {
        Zone {
            name: self.name.clone(),
            positions: self.positions.difference(&other.positions).copied().collect(),
        }
    }

    /// Keeps only positions matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&NotePosition) -> bool) {
        self.positions.retain(f);
    }

    /// True iff both zones hold identical position sets.
    #[must_use]
    pub fn equals(&self, other: &Zone) -> bool {
        self.positions == other.positions
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Zone {}

impl Extend<NotePosition> for Zone {
    fn extend<T: IntoIterator<Item = NotePosition>>(&mut self, iter: T) {
        for position in iter {
            self.add(position);
        }
    }
}

impl FromIterator<NotePosition> for Zone {
    fn from_iter<T: IntoIterator<Item = NotePosition>>(iter: T) -> Self {
        Self::from_positions(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(string: u8, fret: u8) -> NotePosition {
        NotePosition::new(string, fret)
    }

    #[test]
    fn add_then_contains_and_remove() {
        let mut zone = Zone::new();
        for string in 1..=6 {
            for fret in 0..=24 {
                let p = pos(string, fret);
                assert!(zone.add(p));
                assert!(zone.contains(p));
                assert!(zone.remove(p));
                assert!(!zone.contains(p));
            }
        }
        assert!(zone.is_empty());
    }

    #[test]
    fn add_rejects_invalid_and_duplicates() {
        let mut zone = Zone::new();
        assert!(!zone.add(pos(0, 1)));
        assert!(!zone.add(pos(7, 1)));
        assert!(!zone.add(pos(1, 25)));
        assert!(zone.add(pos(1, 1)));
        assert!(!zone.add(pos(1, 1)));
        assert_eq!(zone.size(), 1);
        assert!(!zone.remove(pos(2, 2)));
    }

    #[test]
    fn positions_are_sorted_by_string_then_fret() {
        let zone = Zone::from_positions([pos(3, 1), pos(1, 9), pos(1, 2), pos(2, 0)]);
        assert_eq!(
            zone.all_positions(),
            vec![pos(1, 2), pos(1, 9), pos(2, 0), pos(3, 1)]
        );
        assert_eq!(zone.strings(), vec![1, 2, 3]);
        assert_eq!(zone.min_fret(), Some(0));
        assert_eq!(zone.max_fret(), Some(9));
    }

    #[test]
    fn clone_is_independent() {
        let mut original = Zone::named("box");
        original.add(pos(1, 1));
        let mut copy = original.clone();
        copy.add(pos(2, 2));
        assert_eq!(original.size(), 1);
        assert_eq!(copy.size(), 2);
        assert_eq!(copy.name(), Some("box"));
    }

    #[test]
    fn set_algebra() {
        let mut a = Zone::from_positions([pos(1, 1), pos(1, 2)]);
        let b = Zone::from_positions([pos(1, 2), pos(1, 3)]);

        let both = a.intersection(&b);
        assert_eq!(both.all_positions(), vec![pos(1, 2)]);
        assert_eq!(a.size(), 2);
        assert_eq!(b.size(), 2);

        assert_eq!(a.difference(&b).all_positions(), vec![pos(1, 1)]);
        assert_eq!(a.union(&b).size(), 3);

        a.merge(&b);
        assert_eq!(a.size(), 3);
    }

    #[test]
    fn equality_ignores_name() {
        let a = Zone::from_positions([pos(1, 1)]).with_name(Some("first"));
        let b = Zone::from_positions([pos(1, 1)]).with_name(Some("second"));
        assert!(a.equals(&b));
        assert_eq!(a, b);
        assert_ne!(a, Zone::new());
    }

    #[test]
    fn blank_name_is_none() {
        let zone = Zone::new().with_name(Some("   "));
        assert_eq!(zone.name(), None);
    }
}
