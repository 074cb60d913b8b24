//! Configuration for a [`World`](crate::World).

/// Tuning and feature switches for a world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Whether stable reference handles are maintained.
    ///
    /// When disabled, `get_ref` fails with `ReferencesDisabled` and row moves
    /// skip the reference bookkeeping entirely.
    pub track_references: bool,

    /// Upper bound on the number of component types in one archetype.
    /// `None` means unbounded.
    pub max_components_per_archetype: Option<usize>,

    /// Number of archetypes to reserve space for up front.
    pub archetype_capacity: usize,

    /// Number of entities to reserve directory space for up front.
    pub entity_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            track_references: true,
            max_components_per_archetype: None,
            archetype_capacity: 16,
            entity_capacity: 0,
        }
    }
}

impl WorldConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings with no bound on archetype width.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Default settings with archetypes capped at `limit` component types.
    #[must_use]
    pub fn bounded(limit: usize) -> Self {
        Self::default().with_max_components_per_archetype(Some(limit))
    }

    /// Builder method to enable/disable reference tracking.
    #[must_use]
    pub const fn with_reference_tracking(mut self, enabled: bool) -> Self {
        self.track_references = enabled;
        self
    }

    /// Builder method to set the archetype width bound.
    #[must_use]
    pub const fn with_max_components_per_archetype(mut self, limit: Option<usize>) -> Self {
        self.max_components_per_archetype = limit;
        self
    }

    /// Builder method to set the archetype reservation.
    #[must_use]
    pub const fn with_archetype_capacity(mut self, capacity: usize) -> Self {
        self.archetype_capacity = capacity;
        self
    }

    /// Builder method to set the entity reservation.
    #[must_use]
    pub const fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }
}
