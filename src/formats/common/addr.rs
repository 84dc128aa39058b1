//! Address-to-index lookup tables.
//!
//! The format has no record indices on disk; every cross-reference is a raw
//! file offset pointing at another record's start. After a record category
//! is fully parsed, its start addresses are frozen into an [`AddressTable`]
//! and every pointer field is resolved against it. Pointers must never be
//! resolved against a partially built table: forward references are common.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Sentinel index for a null (zero) address.
pub const NO_INDEX: i32 = -1;

/// Maps record start addresses to their sequential parse order.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    addresses: Vec<u32>,
    by_address: HashMap<u32, usize>,
    category: &'static str,
}

impl AddressTable {
    /// Freeze a fully parsed category's record addresses into a table.
    /// `category` names the record kind in resolution errors.
    #[must_use]
    pub fn new(category: &'static str, addresses: Vec<u32>) -> Self {
        let by_address = addresses
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, i))
            .collect();
        Self {
            addresses,
            by_address,
            category,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Resolve a pointer that must reference a known record.
    pub fn resolve(&self, address: u32) -> Result<usize> {
        self.by_address
            .get(&address)
            .copied()
            .ok_or(Error::UnresolvedAddress {
                table: self.category,
                address,
            })
    }

    /// Resolve a pointer field that may be null. A zero address yields the
    /// [`NO_INDEX`] sentinel; any other unknown address is an error.
    pub fn resolve_optional(&self, address: u32) -> Result<i32> {
        if address == 0 {
            return Ok(NO_INDEX);
        }
        Ok(self.resolve(address)? as i32)
    }
}
