// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits between the resolution core and its external collaborators.

mod catalog;
mod directory;
mod store;

use std::fmt::{Debug, Display};
use std::hash::Hash as StdHash;

pub use catalog::ResourceCatalog;
pub use directory::PrincipalDirectory;
pub use store::{GrantIndex, GrantStore};

/// Handle onto a resource identity.
///
/// `Ord` is required so identifiers can be used as graph nodes in the containment tree index.
pub trait ResourceId: Copy + Debug + Display + Eq + StdHash + Ord {}

/// Handle onto a principal identity. Opaque to the core; no role or profile data is attached.
pub trait PrincipalId: Copy + Debug + Display + Eq + StdHash {}
