use super::dimension::{DimensionError, ReplicaDimension};
use super::variants::{AmdDihedralDim, SgldDim, TemperatureDim, TopologyDim};
use phf::{Map, phf_map};
use std::path::Path;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DimensionKind {
    Temperature,
    Topology,
    AmdDihedral,
    Sgld,
}

impl DimensionKind {
    fn construct(self) -> Box<dyn ReplicaDimension> {
        match self {
            DimensionKind::Temperature => Box::new(TemperatureDim::default()),
            DimensionKind::Topology => Box::new(TopologyDim::default()),
            DimensionKind::AmdDihedral => Box::new(AmdDihedralDim::default()),
            DimensionKind::Sgld => Box::new(SgldDim::default()),
        }
    }
}

static REGISTRY: Map<&'static str, DimensionKind> = phf_map! {
    "TEMPERATURE" => DimensionKind::Temperature,
    "TOPOLOGY" => DimensionKind::Topology,
    "AMD_DIHEDRAL" => DimensionKind::AmdDihedral,
    "SGLD" => DimensionKind::Sgld,
};

/// Creates replica dimensions from their registry key.
///
/// The registry is a compile-time map, so it is immutable and can be shared
/// freely between threads. Keys are matched exactly and case-sensitively.
pub struct ReplicaAllocator;

impl ReplicaAllocator {
    /// A new, empty dimension for `key`, or `None` if the key is unknown.
    pub fn allocate(key: &str) -> Option<Box<dyn ReplicaDimension>> {
        REGISTRY.get(key).map(|kind| kind.construct())
    }

    /// Like [`ReplicaAllocator::allocate`], but an unknown key is an error.
    pub fn try_allocate(key: &str) -> Result<Box<dyn ReplicaDimension>, DimensionError> {
        Self::allocate(key).ok_or_else(|| {
            error!("Unrecognized replica dimension '{}'.", key);
            DimensionError::UnknownKey(key.to_string())
        })
    }

    /// Allocates the dimension for `key` and loads it from `path`.
    pub fn load(key: &str, path: &Path) -> Result<Box<dyn ReplicaDimension>, DimensionError> {
        let mut dim = Self::try_allocate(key)?;
        dim.load_dim(path).inspect_err(|e| error!("{}", e))?;
        Ok(dim)
    }

    pub fn keys() -> impl Iterator<Item = &'static str> {
        REGISTRY.keys().copied()
    }
}
