//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identity is assigned by the persistence layer, so an entity that has not
/// been stored yet has no identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, if one has been assigned.
    fn id(&self) -> Option<&Self::Id>;

    /// Whether the persistence layer has assigned an identifier.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
