//! Text rendering of a tree, root first, one hex node per line.

use std::fmt;

use accum_core::Hasher;

use crate::tree::MerkleTree;

impl<H: Hasher> MerkleTree<H> {
    /// Render the tree with box-drawing connectors.
    ///
    /// ```text
    /// └─ 01020304
    ///    ├─ 0102
    ///    │  ├─ 01
    ///    │  └─ 02
    ///    └─ 0304
    ///       ├─ 03
    ///       └─ 04
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.layers.last().map_or(false, |top| !top.is_empty()) {
            self.render_node(self.layers.len() - 1, 0, "", true, &mut out);
        }
        out
    }

    fn render_node(&self, layer: usize, index: usize, prefix: &str, last: bool, out: &mut String) {
        out.push_str(prefix);
        out.push_str(if last { "└─ " } else { "├─ " });
        out.push_str(&self.layers[layer][index].to_plain_hex());
        out.push('\n');
        let prefix = format!("{prefix}{}", if last { "   " } else { "│  " });
        let children = self.children_of(layer, index);
        for (k, child) in children.iter().enumerate() {
            self.render_node(layer - 1, *child, &prefix, k + 1 == children.len(), out);
        }
    }
}

impl<H: Hasher> fmt::Display for MerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
