//! Shared binary-reading primitives for the RSL format family.

pub mod addr;
pub mod cursor;
pub mod list;

pub use addr::{AddressTable, NO_INDEX};
pub use cursor::{ByteCursor, Endianness};
pub use list::read_linked_list;

/// De-duplicate names in place by appending a suffix built from the entry's
/// ordinal. The first occurrence keeps its name; repeats become
/// `name<sep><index>`. Used for texture names (empty separator) and bone
/// names (`_` separator).
pub fn dedupe_names(names: &mut [String], separator: &str) {
    let mut seen: Vec<String> = Vec::with_capacity(names.len());
    for (i, name) in names.iter_mut().enumerate() {
        if seen.contains(name) {
            *name = format!("{name}{separator}{i}");
        } else {
            seen.push(name.clone());
        }
    }
}
