//! JSON input files: body graphs and seed maps.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use cleave_core::{
    BodyId, GraphSource, GraphSourceError, RawBodyGraph, RawEdge, SeedAssignments, SeedLabel,
    StoreVersion, SupervoxelId,
};
use serde::Deserialize;
use tracing::{Span, debug, field, instrument};

use super::CliError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BodyFile {
    body: u64,
    #[serde(default)]
    supervoxels: Option<Vec<u64>>,
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgeRecord {
    u: u64,
    v: u64,
    weight: f32,
    #[serde(default)]
    rank: Option<u64>,
}

impl From<EdgeRecord> for RawEdge {
    fn from(record: EdgeRecord) -> Self {
        let edge = Self::new(
            SupervoxelId::new(record.u),
            SupervoxelId::new(record.v),
            record.weight,
        );
        match record.rank {
            Some(rank) => edge.with_rank(rank),
            None => edge,
        }
    }
}

/// [`GraphSource`] serving the single body described by a JSON file.
///
/// The file has no notion of store versions, so every version sees the same
/// graph.
#[derive(Debug, Clone)]
pub struct JsonGraphSource {
    name: String,
    graph: RawBodyGraph,
}

impl JsonGraphSource {
    /// Loads the body file at `path`.
    ///
    /// # Errors
    /// Returns [`CliError::Io`] when the file cannot be opened and
    /// [`CliError::Json`] when it is not a valid body file.
    #[instrument(name = "cli.load_graph", err, fields(path = %path.display(), edges = field::Empty))]
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let body: BodyFile = read_json(path)?;
        Span::current().record("edges", body.edges.len());
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("graph")
            .to_owned();
        Ok(Self::new(name, body))
    }

    /// Parses a body file from `reader`.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] when the input is not a valid body file.
    pub fn from_reader(name: impl Into<String>, reader: impl Read) -> serde_json::Result<Self> {
        let body: BodyFile = serde_json::from_reader(reader)?;
        Ok(Self::new(name.into(), body))
    }

    fn new(name: String, file: BodyFile) -> Self {
        let body = BodyId::new(file.body);
        let edges: Vec<RawEdge> = file.edges.into_iter().map(RawEdge::from).collect();
        let graph = match file.supervoxels {
            Some(supervoxels) => RawBodyGraph::new(
                body,
                supervoxels.into_iter().map(SupervoxelId::new).collect(),
                edges,
            ),
            None => RawBodyGraph::from_edges(body, edges),
        };
        Self { name, graph }
    }

    /// Returns the body described by the file.
    #[must_use]
    pub fn body(&self) -> BodyId {
        self.graph.body()
    }
}

impl GraphSource for JsonGraphSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_body_graph(
        &self,
        body: BodyId,
        _version: &StoreVersion,
    ) -> Result<RawBodyGraph, GraphSourceError> {
        if body != self.graph.body() {
            return Err(GraphSourceError::UnknownBody { body });
        }
        Ok(self.graph.clone())
    }
}

/// Loads a seed file mapping labels to supervoxel lists, e.g.
/// `{"1": [101, 102], "2": [205]}`.
///
/// # Errors
/// Returns [`CliError::Io`] or [`CliError::Json`] for unreadable files and
/// [`CliError::InvalidSeedLabel`] for keys that are not unsigned integers.
#[instrument(name = "cli.load_seeds", err, fields(path = %path.display()))]
pub fn load_seeds(path: &Path) -> Result<SeedAssignments, CliError> {
    let file: BTreeMap<String, Vec<u64>> = read_json(path)?;
    let mut groups = Vec::with_capacity(file.len());
    for (label, supervoxels) in file {
        let parsed = label
            .trim()
            .parse::<u64>()
            .map_err(|_| CliError::InvalidSeedLabel { label })?;
        groups.push((
            SeedLabel::new(parsed),
            supervoxels.into_iter().map(SupervoxelId::new),
        ));
    }
    let seeds = SeedAssignments::from_groups(groups);
    debug!(seeds = seeds.len(), "seed file loaded");
    Ok(seeds)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}
