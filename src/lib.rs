//! # stream-rax
//!
//! An append-mostly stream log indexed by an order-preserving adaptive radix
//! tree.
//!
//! The crate has three layers:
//!
//! - [`art`]: an adaptive radix tree over byte-string keys with a
//!   bidirectional [`Cursor`](art::Cursor) that can be positioned with a
//!   comparison operator ([`SeekOp`](art::SeekOp)).
//! - [`stream`]: [`StreamId`] and its order-preserving 16-byte encoding, and
//!   [`Stream`], which stores entries in the tree under their encoded IDs.
//! - [`store`] and [`cmd`]: a keyspace of streams and the `XADD` / `XRANGE`
//!   commands evaluated against it.
//!
//! ## Example
//!
//! ```rust
//! use stream_rax::cmd::{xadd, xrange};
//! use stream_rax::Store;
//!
//! let store = Store::new();
//! let first = xadd(&store, &["events", "*", "kind", "login"]).unwrap();
//! let second = xadd(&store, &["events", "*", "kind", "logout"]).unwrap();
//! assert!(second > first);
//!
//! let entries = xrange(&store, &["events", "-", "+"]).unwrap();
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].id, first);
//! ```
//!
//! The tree can also be used on its own:
//!
//! ```rust
//! use stream_rax::art::{SeekOp, Tree};
//!
//! let mut tree: Tree<u32> = Tree::new();
//! for (i, fruit) in ["apple", "banana", "cherry"].iter().enumerate() {
//!     tree.insert(fruit.as_bytes(), i as u32);
//! }
//!
//! let mut cursor = tree.cursor();
//! assert!(cursor.seek_with_operation(b"b", SeekOp::Ge));
//! assert_eq!(cursor.next(), Some((&b"banana"[..], &1)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod art;
pub mod cmd;
pub mod error;
pub mod store;
pub mod stream;

pub use error::{Error, Result};
pub use store::{Config, Object, Store};
pub use stream::{Fields, Stream, StreamId};

#[cfg(test)]
mod proptests;
