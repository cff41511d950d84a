//! Path sandboxing.
//!
//! Three pieces, applied in order by a provider's resolver:
//!
//! - [`RootMap`] picks the most specific virtual root for a request
//! - [`canonicalize_within`] resolves symlinks under a [`SymlinkMode`] and
//!   enforces that the result stays inside the canonical root
//! - [`AccessPolicy`] applies allow and deny patterns to the canonical path

mod access;
mod canonical;
mod mode;
mod roots;

pub use access::AccessPolicy;
pub use canonical::{canonical_root, canonicalize_within, clean_path, ensure_contained};
pub use mode::SymlinkMode;
pub use roots::{RootMap, RootMatch};
