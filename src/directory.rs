// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use crate::traits::{PrincipalDirectory, PrincipalId};

/// An in-memory principal directory.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory<P> {
    principals: HashSet<P>,
}

impl<P> MemoryDirectory<P>
where
    P: PrincipalId,
{
    pub fn new(principals: impl IntoIterator<Item = P>) -> Self {
        Self {
            principals: principals.into_iter().collect(),
        }
    }

    /// Register another principal.
    pub fn insert(&mut self, principal: P) -> bool {
        self.principals.insert(principal)
    }
}

impl<P> PrincipalDirectory<P> for MemoryDirectory<P>
where
    P: PrincipalId,
{
    fn contains(&self, id: &P) -> bool {
        self.principals.contains(id)
    }

    fn principals(&self) -> Vec<P> {
        self.principals.iter().copied().collect()
    }
}
