use std::fmt;
use serde::{Deserialize, Serialize};
use crate::block_position::BlockPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A block identifier the registry could not resolve was replaced by the fallback state.
    UnknownBlock,
    /// The target format has no exact representation for a block state.
    UnmappedBlock,
    DroppedBlockEntity,
    DroppedEntity,
    DroppedTicks,
    DroppedBiomes,
}

/// Non-fatal notice that a conversion lost or altered data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionWarning {
    pub kind: WarningKind,
    pub message: String,
    pub position: Option<BlockPosition>,
}

impl ConversionWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        ConversionWarning { kind, message: message.into(), position: None }
    }

    pub fn at(kind: WarningKind, position: BlockPosition, message: impl Into<String>) -> Self {
        ConversionWarning { kind, message: message.into(), position: Some(position) }
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{:?} at {}: {}", self.kind, position, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}
