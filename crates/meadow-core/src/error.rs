use crate::catalog::CatalogKind;
use crate::entity::EntityId;
use crate::geometry::Point;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when manipulating the world or reading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A catalog id was referenced that the catalog does not define.
    ///
    /// Static data is expected to be internally consistent, so callers treat
    /// this as unrecoverable.
    #[error("unknown {kind} id {id} in catalog")]
    MissingCatalogEntry {
        /// Which catalog table was searched.
        kind: CatalogKind,
        /// The id that could not be resolved.
        id: u32,
    },

    /// The requested entity does not exist in the registry.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but is not of the expected kind.
    #[error("entity {id} is not a {expected}")]
    WrongKind {
        /// The entity that was looked up.
        id: EntityId,
        /// The kind the caller expected.
        expected: &'static str,
    },

    /// A position with a non-finite coordinate was supplied.
    #[error("invalid position {position:?} for entity {id}")]
    InvalidPosition {
        /// Entity being moved.
        id: EntityId,
        /// The rejected position.
        position: Point,
    },

    /// The catalog source could not be parsed.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl CoreError {
    /// Returns `true` for errors that signal corrupt static data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCatalogEntry { .. } | Self::InvalidCatalog(_)
        )
    }
}
