//! This module provides [PartyJar], a type that collects an item from each of a pre-defined set of parties.

/// A jar where every party puts an element.
///
/// The jar has one slot per party, addressed by the party's index. A slot can only be written once: the jar
/// never replaces nor clears an element once it has been put.
#[derive(Debug, Clone)]
pub struct PartyJar<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for PartyJar<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> PartyJar<T> {
    /// Constructs a new jar that expects the given number of parties.
    pub fn new(party_count: usize) -> Self {
        let slots = std::iter::repeat_with(|| None).take(party_count).collect();
        Self { slots }
    }

    /// The number of parties this jar expects.
    pub fn party_count(&self) -> usize {
        self.slots.len()
    }

    /// Check whether this jar is full.
    ///
    /// A jar becomes full when every party has put their element into it.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Check whether this jar is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Check how many parties we have elements for.
    pub fn stored_party_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check whether the party at the given index has put its element.
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Add an element for the party at the given index.
    ///
    /// This returns an error if the index is out of range or the party has already provided an element.
    pub fn add_element(&mut self, index: usize, element: T) -> Result<(), SlotError> {
        let party_count = self.party_count();
        let slot = self.slots.get_mut(index).ok_or(SlotError::IndexOutOfRange { index, party_count })?;
        if slot.is_some() {
            return Err(SlotError::Occupied(index));
        }
        *slot = Some(element);
        Ok(())
    }

    /// Get the element for the party at the given index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Take a reference to the elements in this jar.
    ///
    /// The returned elements *are guaranteed to be sorted by party index*.
    pub fn elements(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| slot.as_ref().map(|element| (index, element)))
    }
}

/// An error when putting an element into a [PartyJar].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The party index is not part of this jar.
    #[error("party index {index} out of range for {party_count} parties")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,

        /// The number of parties in the jar.
        party_count: usize,
    },

    /// The party already provided its element.
    #[error("party {0} already provided element")]
    Occupied(usize),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default() {
        let jar = PartyJar::<u32>::default();
        assert!(jar.is_empty());
        assert_eq!(jar.stored_party_count(), 0);
    }

    #[test]
    fn duplicate_party() {
        let mut jar = PartyJar::new(2);
        assert!(jar.add_element(1, 1).is_ok());
        assert_eq!(jar.add_element(1, 2), Err(SlotError::Occupied(1)));
        assert_eq!(jar.get(1), Some(&1));
    }

    #[test]
    fn out_of_range() {
        let mut jar = PartyJar::new(2);
        assert_eq!(jar.add_element(2, 1), Err(SlotError::IndexOutOfRange { index: 2, party_count: 2 }));
        assert!(jar.is_empty());
    }

    #[test]
    fn full() {
        let mut jar = PartyJar::new(2);
        jar.add_element(1, 1).unwrap();
        assert!(!jar.is_full());
        assert!(jar.contains(1));
        assert!(!jar.contains(0));

        jar.add_element(0, 0).unwrap();
        assert!(jar.is_full());
        assert_eq!(jar.stored_party_count(), 2);
    }

    #[test]
    fn retrieve_elements() {
        let mut jar = PartyJar::new(3);
        jar.add_element(2, "c").unwrap();
        jar.add_element(0, "a").unwrap();

        let elements: Vec<_> = jar.elements().map(|(index, element)| (index, *element)).collect();
        assert_eq!(elements, vec![(0, "a"), (2, "c")]);
        assert_eq!(jar.party_count(), 3);
    }
}
