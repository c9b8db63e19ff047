use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the block catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);

    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a block interacts with light and face culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opacity {
    Air,
    Transparent,
    Opaque,
}

/// A voxel as returned by queries: catalog id plus the packed light sample
/// (sky nibble high, emitted nibble low).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub light: u8,
}

impl Block {
    pub const AIR: Block = Block {
        id: BlockId::AIR,
        light: 0,
    };

    pub fn sky_light(self) -> u8 {
        self.light >> 4
    }

    pub fn block_light(self) -> u8 {
        self.light & 0x0F
    }
}
