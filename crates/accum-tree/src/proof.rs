//! Single-leaf proof entries.
//!
//! A proof is read bottom-to-top. Each entry carries one sibling hash and,
//! unless it is a bare hash, the side the sibling sits on. The three textual
//! shapes map to the three variants of [`ProofEntry`]:
//!
//! | JSON                                 | variant                |
//! |--------------------------------------|------------------------|
//! | `"0x0102"`                           | [`ProofEntry::Bare`]   |
//! | `{"position": "left", "data": "0x…"}` | [`ProofEntry::Sided`]  |
//! | `[0, "0x0102"]` (0 = left)           | [`ProofEntry::Positional`] |

use accum_core::Hash;
use serde::{Deserialize, Serialize};

/// Which side of the running hash a sibling is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Positional encoding: 0 for left, 1 for right.
    pub fn bit(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// One step of a single-leaf proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofEntry {
    /// A sibling with no side information. Treated as a left sibling
    /// unless the tree sorts pairs, where the side is irrelevant.
    Bare(Hash),
    /// A sibling tagged with its side.
    Sided { position: Side, data: Hash },
    /// `[side_bit, hash]` with 0 meaning left; any other bit means right.
    Positional(u8, Hash),
}

impl ProofEntry {
    /// A side-tagged entry.
    pub fn sided(position: Side, data: Hash) -> Self {
        Self::Sided { position, data }
    }

    /// The sibling hash.
    pub fn data(&self) -> &Hash {
        match self {
            Self::Bare(data) | Self::Sided { data, .. } | Self::Positional(_, data) => data,
        }
    }

    /// True when the sibling is combined on the left of the running hash.
    pub fn is_left(&self) -> bool {
        match self {
            Self::Bare(_) => true,
            Self::Sided { position, .. } => *position == Side::Left,
            Self::Positional(bit, _) => *bit == 0,
        }
    }

    /// The same sibling in `[bit, hash]` form.
    pub fn to_positional(&self) -> Self {
        let bit = if self.is_left() { 0 } else { 1 };
        Self::Positional(bit, self.data().clone())
    }
}
