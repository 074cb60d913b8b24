//! Archetype signatures.
//!
//! A [`Signature`] is the exact schema of an archetype: the set of component
//! ids (with element sizes as metadata). It decides archetype identity when
//! looking up or creating archetypes.
//!
//! A [`FastSignature`] is a bitset over component ids used on the query hot
//! path for superset tests. It grows with the largest id it holds, so the
//! component universe is unbounded.

use std::fmt;

use strata_foundation::{Component, ComponentId};

const WORD_BITS: usize = u64::BITS as usize;

/// Exact set of component ids, kept sorted by id.
#[derive(Clone, Default)]
pub struct Signature {
    components: Vec<(ComponentId, usize)>,
}

impl Signature {
    /// Creates an empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component id with its element size.
    ///
    /// Returns `false` if the id was already present.
    pub fn add(&mut self, id: ComponentId, size: usize) -> bool {
        match self.components.binary_search_by_key(&id, |(c, _)| *c) {
            Ok(_) => false,
            Err(pos) => {
                self.components.insert(pos, (id, size));
                true
            }
        }
    }

    /// Adds component type `T`.
    pub fn add_type<T: Component>(&mut self) -> bool {
        self.add(ComponentId::of::<T>(), std::mem::size_of::<T>())
    }

    /// Returns a new signature with the component added.
    #[must_use]
    pub fn with(&self, id: ComponentId, size: usize) -> Self {
        let mut next = self.clone();
        next.add(id, size);
        next
    }

    /// Returns a new signature with the component removed.
    #[must_use]
    pub fn without(&self, id: ComponentId) -> Self {
        let mut next = self.clone();
        if let Ok(pos) = next.components.binary_search_by_key(&id, |(c, _)| *c) {
            next.components.remove(pos);
        }
        next
    }

    /// Checks if this signature contains a component.
    #[must_use]
    pub fn contains_id(&self, id: ComponentId) -> bool {
        self.components
            .binary_search_by_key(&id, |(c, _)| *c)
            .is_ok()
    }

    /// Checks if every component in `other` is also in this signature.
    #[must_use]
    pub fn contains(&self, other: &Signature) -> bool {
        other.len() <= self.len() && other.ids().all(|id| self.contains_id(id))
    }

    /// Number of component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the signature has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.iter().map(|(id, _)| *id)
    }

    /// `(id, element size)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, usize)> + '_ {
        self.components.iter().copied()
    }

    /// Builds the bitset form of this signature.
    #[must_use]
    pub fn fast(&self) -> FastSignature {
        self.ids().collect()
    }
}

/// Equality is set equality over ids; sizes are metadata.
impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.ids().eq(other.ids())
    }
}

impl Eq for Signature {}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ids().map(ComponentId::index)).finish()
    }
}

impl FromIterator<(ComponentId, usize)> for Signature {
    fn from_iter<I: IntoIterator<Item = (ComponentId, usize)>>(iter: I) -> Self {
        let mut signature = Signature::new();
        for (id, size) in iter {
            signature.add(id, size);
        }
        signature
    }
}

/// Bitset over component ids with a population counter.
#[derive(Clone, Default)]
pub struct FastSignature {
    words: Vec<u64>,
    count: usize,
}

impl FastSignature {
    /// Creates an empty bitset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bit for `id`.
    pub fn add(&mut self, id: ComponentId) {
        let (word, mask) = Self::locate(id);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        if self.words[word] & mask == 0 {
            self.words[word] |= mask;
            self.count += 1;
        }
    }

    /// Single-bit membership test.
    #[must_use]
    pub fn contains_id(&self, id: ComponentId) -> bool {
        let (word, mask) = Self::locate(id);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Superset test: true iff `(self & other) == other`.
    #[must_use]
    pub fn contains(&self, other: &FastSignature) -> bool {
        if self.count < other.count {
            return false;
        }
        other.words.iter().enumerate().all(|(i, &theirs)| {
            let ours = self.words.get(i).copied().unwrap_or(0);
            ours & theirs == theirs
        })
    }

    /// Number of set bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn locate(id: ComponentId) -> (usize, u64) {
        let index = id.index() as usize;
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }
}

impl fmt::Debug for FastSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..WORD_BITS).filter_map(move |b| ((word >> b) & 1 == 1).then_some(w * WORD_BITS + b))
        });
        f.debug_set().entries(bits).finish()
    }
}

impl FromIterator<ComponentId> for FastSignature {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut signature = FastSignature::new();
        for id in iter {
            signature.add(id);
        }
        signature
    }
}
