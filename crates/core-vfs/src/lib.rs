//! Virtual filesystem over the capture's queryable data.
//!
//! Two halves cooperate: the [`router`] maps any syntactically valid path to
//! the handler + args that produce its content, and the [`tree`] holds the
//! *reachable* namespace — a static skeleton built once at open plus
//! dynamically populated subtrees bounded by an LRU. A path is listable iff
//! its node is in the static dictionary; the router alone decides what a
//! `cat` of a leaf means.

pub mod formatter;
pub mod router;
pub mod tree;

pub use formatter::{render_ls, render_ls_long, render_tree_root};
pub use router::{resolve_path, NodeKind, PathMatch};
pub use tree::{build_vfs_skeleton, populate_draw_subtree, populate_shaders_subtree, VfsNode, VfsTree};
