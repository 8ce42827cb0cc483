//! Collaborator contract for the segmentation store.

use crate::{
    error::GraphSourceError,
    graph::RawBodyGraph,
    ids::{BodyId, StoreVersion},
};

/// Supplies body graphs from a versioned segmentation store.
///
/// Implementations perform whatever I/O is needed; the engine calls
/// [`GraphSource::fetch_body_graph`] once per request before any computation.
///
/// # Examples
/// ```
/// use cleave_core::{
///     BodyId, GraphSource, GraphSourceError, RawBodyGraph, RawEdge, StoreVersion, SupervoxelId,
/// };
///
/// struct Fixed;
///
/// impl GraphSource for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     fn fetch_body_graph(
///         &self,
///         body: BodyId,
///         _version: &StoreVersion,
///     ) -> Result<RawBodyGraph, GraphSourceError> {
///         if body != BodyId::new(1) {
///             return Err(GraphSourceError::UnknownBody { body });
///         }
///         let sv = SupervoxelId::new;
///         Ok(RawBodyGraph::from_edges(body, vec![RawEdge::new(sv(1), sv(2), 0.5)]))
///     }
/// }
///
/// let version = StoreVersion::new("abc123");
/// assert!(Fixed.fetch_body_graph(BodyId::new(1), &version).is_ok());
/// assert!(Fixed.fetch_body_graph(BodyId::new(2), &version).is_err());
/// ```
pub trait GraphSource {
    /// Returns a human-readable name.
    fn name(&self) -> &str;

    /// Fetches the supervoxels and merge-evidence edges of `body` at `version`.
    ///
    /// # Errors
    /// Returns [`GraphSourceError::StoreUnavailable`] when the store cannot be
    /// reached and [`GraphSourceError::UnknownBody`] when the body does not
    /// exist at that version.
    fn fetch_body_graph(
        &self,
        body: BodyId,
        version: &StoreVersion,
    ) -> Result<RawBodyGraph, GraphSourceError>;
}

impl<S: GraphSource + ?Sized> GraphSource for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_body_graph(
        &self,
        body: BodyId,
        version: &StoreVersion,
    ) -> Result<RawBodyGraph, GraphSourceError> {
        (**self).fetch_body_graph(body, version)
    }
}
