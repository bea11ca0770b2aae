// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::traits::PrincipalId;

/// Read-only view onto the set of principals eligible to receive grants.
pub trait PrincipalDirectory<P>
where
    P: PrincipalId,
{
    /// Return `true` if the given principal exists in the directory.
    fn contains(&self, id: &P) -> bool;

    /// All known principals.
    fn principals(&self) -> Vec<P>;
}
