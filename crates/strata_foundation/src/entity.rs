//! Entity identifiers.

use std::fmt;

/// Opaque handle identifying one logical record.
///
/// Entities are plain monotonically increasing integers. The value `0` is
/// reserved as [`Entity::NULL`] and is never issued by a world; the first
/// entity a world creates is `1`. Identifiers are not reused within the
/// world that issued them.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Entity(u64);

impl Entity {
    /// The reserved "no entity" value.
    pub const NULL: Entity = Entity(0);

    /// Creates an entity handle from a raw index.
    #[must_use]
    pub const fn from_raw(index: u64) -> Self {
        Self(index)
    }

    /// Returns the raw index of this entity.
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the entity issued after this one.
    #[must_use]
    pub(crate) const fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.0)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Monotonic entity id generator.
///
/// Starts at `1` so that [`Entity::NULL`] is never handed out.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next: Entity,
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityAllocator {
    /// Creates a new allocator whose first id is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: Entity::from_raw(1),
        }
    }

    /// Issues the next entity id.
    pub fn allocate(&mut self) -> Entity {
        let entity = self.next;
        self.next = entity.successor();
        entity
    }

    /// Returns the id that the next call to [`allocate`](Self::allocate) will issue.
    #[must_use]
    pub const fn peek(&self) -> Entity {
        self.next
    }

    /// Number of ids issued so far.
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.next.index() - 1
    }
}
