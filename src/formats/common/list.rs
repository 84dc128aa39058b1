//! Linked record list walker.
//!
//! Several RSL record categories are stored as on-disk linked chains of
//! fixed-shape records rather than counted arrays. Each node is laid out as
//! `[8-byte tag (tagged lists only)] [back pointer (bidirectional lists
//! only)] [forward pointer] [payload]`, and a forward pointer of zero
//! terminates the chain after the terminal payload has been consumed.
//! Counts recorded elsewhere in the file are advisory only, so the walk is
//! driven purely by the pointers found in the stream.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::formats::common::ByteCursor;

/// Walk a linked record chain starting at the cursor's current position.
///
/// A current position of zero yields an empty list: zero is the null
/// address, and callers seed the walk by seeking to a section address that
/// may legitimately be absent.
///
/// `addresses` and `tags` are optional sinks; when supplied they receive
/// each record's start address (later used as the linkage key for
/// cross-references) and its leading 8-byte tag. The tag field is only
/// present on disk for the record shapes that carry one, which is why its
/// consumption is tied to the sink being requested.
///
/// A revisited node address is a hard error; the chain is otherwise
/// unbounded and a corrupt pointer could walk forever.
pub fn read_linked_list<'a, T>(
    cur: &mut ByteCursor<'a>,
    bidirectional: bool,
    mut addresses: Option<&mut Vec<u32>>,
    mut tags: Option<&mut Vec<String>>,
    mut read_record: impl FnMut(&mut ByteCursor<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut records = Vec::new();
    let mut visited = HashSet::new();
    let mut next = cur.position() as u32;

    while next != 0 {
        if !visited.insert(next) {
            return Err(Error::ListCycle { address: next });
        }
        if let Some(out) = addresses.as_deref_mut() {
            out.push(next);
        }

        cur.seek(u64::from(next))?;

        if let Some(out) = tags.as_deref_mut() {
            out.push(cur.read_tag(8)?);
        }
        if bidirectional {
            let _back = cur.read_u32()?;
        }
        next = cur.read_u32()?;

        records.push(read_record(cur)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::common::Endianness;
    use pretty_assertions::assert_eq;

    /// Build a chain of unidirectional `[next][payload u32]` nodes starting
    /// at offset 4, returning the buffer.
    fn chain(values: &[u32]) -> Vec<u8> {
        let mut buf = vec![0u8; 4]; // keep node addresses non-zero
        for (i, v) in values.iter().enumerate() {
            let next = if i + 1 < values.len() {
                (buf.len() + 8) as u32
            } else {
                0
            };
            buf.extend_from_slice(&next.to_be_bytes());
            buf.extend_from_slice(&v.to_be_bytes());
        }
        buf
    }

    #[test]
    fn walks_chains_of_any_length() {
        for n in 0..5u32 {
            let values: Vec<u32> = (100..100 + n).collect();
            let buf = chain(&values);
            let mut cur = ByteCursor::new(&buf, Endianness::Big);
            if values.is_empty() {
                // no list present; cursor parked at the null address
                cur.seek(0).unwrap();
            } else {
                cur.seek(4).unwrap();
            }
            let mut addrs = Vec::new();
            let got = read_linked_list(&mut cur, false, Some(&mut addrs), None, ByteCursor::read_u32)
                .unwrap();
            assert_eq!(got, values);
            assert_eq!(addrs.len(), values.len());
        }
    }

    #[test]
    fn terminal_record_payload_is_consumed() {
        let buf = chain(&[7]);
        let mut cur = ByteCursor::new(&buf, Endianness::Big);
        cur.seek(4).unwrap();
        let got = read_linked_list(&mut cur, false, None, None, ByteCursor::read_u32).unwrap();
        assert_eq!(got, vec![7]);
    }

    #[test]
    fn bidirectional_nodes_skip_back_pointer() {
        // one node at offset 4: [back][next=0][payload]
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&42u32.to_be_bytes());
        let mut cur = ByteCursor::new(&buf, Endianness::Big);
        cur.seek(4).unwrap();
        let got = read_linked_list(&mut cur, true, None, None, ByteCursor::read_u32).unwrap();
        assert_eq!(got, vec![42]);
    }

    #[test]
    fn tagged_nodes_surface_their_tags() {
        // node at offset 4: [tag 8][next=0][payload]
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(b"bone_a\0\0");
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&9u32.to_be_bytes());
        let mut cur = ByteCursor::new(&buf, Endianness::Big);
        cur.seek(4).unwrap();
        let mut tags = Vec::new();
        let got =
            read_linked_list(&mut cur, false, None, Some(&mut tags), ByteCursor::read_u32).unwrap();
        assert_eq!(got, vec![9]);
        assert_eq!(tags, vec!["bone_a".to_string()]);
    }

    #[test]
    fn cycles_error_instead_of_hanging() {
        // node at offset 4 pointing back at itself
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&4u32.to_be_bytes());
        buf.extend_from_slice(&1u32.to_be_bytes());
        let mut cur = ByteCursor::new(&buf, Endianness::Big);
        cur.seek(4).unwrap();
        let err = read_linked_list(&mut cur, false, None, None, ByteCursor::read_u32).unwrap_err();
        assert!(matches!(err, Error::ListCycle { address: 4 }));
    }
}
