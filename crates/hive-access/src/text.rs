//! UTF-16 payloads and their terminators.
//!
//! Text values are stored as little-endian UTF-16 code units. A String or
//! ExpandableString payload ends with exactly one terminator; a MultiString
//! payload is a run of terminated segments closed by one more terminator.

use hive_types::TERMINATOR;

use crate::buffer::{BufferAllocator, ScopedBuffer};
use crate::error::{AccessError, AccessResult};

const UNIT: usize = std::mem::size_of::<u16>();

/// Stage `units` in a scoped buffer, appending a terminator unless the last
/// unit already is one.
pub fn encode_terminated<I>(units: I, allocator: &dyn BufferAllocator) -> AccessResult<ScopedBuffer>
where
    I: Iterator<Item = u16> + Clone,
{
    let count = units.clone().count();
    let terminated = units.clone().last() == Some(TERMINATOR);
    let total = if terminated { count } else { count + 1 };

    let mut buf = allocator.allocate(total * UNIT)?;
    let padding = (!terminated).then_some(TERMINATOR);
    for (slot, unit) in buf.chunks_exact_mut(UNIT).zip(units.chain(padding)) {
        slot.copy_from_slice(&unit.to_le_bytes());
    }
    Ok(buf)
}

/// Stage a list of segments as a MultiString payload.
///
/// Each segment is followed by a terminator and the list by one more. An
/// empty list is a lone terminator. Segments that are empty or contain a
/// terminator are rejected, since either would end the list early.
pub fn encode_multi<S: AsRef<str>>(
    segments: &[S],
    allocator: &dyn BufferAllocator,
) -> AccessResult<ScopedBuffer> {
    let mut total = 1;
    for (i, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        if segment.is_empty() {
            return Err(AccessError::InvalidValue(format!("segment {i} is empty")));
        }
        if segment.contains('\0') {
            return Err(AccessError::InvalidValue(format!(
                "segment {i} contains a terminator"
            )));
        }
        total += segment.encode_utf16().count() + 1;
    }

    let mut buf = allocator.allocate(total * UNIT)?;
    let units = segments
        .iter()
        .flat_map(|s| s.as_ref().encode_utf16().chain(Some(TERMINATOR)))
        .chain(Some(TERMINATOR));
    for (slot, unit) in buf.chunks_exact_mut(UNIT).zip(units) {
        slot.copy_from_slice(&unit.to_le_bytes());
    }
    Ok(buf)
}

/// Split a payload into code units.
pub fn to_units(bytes: &[u8]) -> AccessResult<Vec<u16>> {
    if bytes.len() % UNIT != 0 {
        return Err(AccessError::Malformed(format!(
            "text payload has odd length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(UNIT)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Decode a String payload, stripping one trailing terminator if present.
pub fn decode_string(bytes: &[u8]) -> AccessResult<String> {
    let mut units = to_units(bytes)?;
    if units.last() == Some(&TERMINATOR) {
        units.pop();
    }
    String::from_utf16(&units).map_err(|e| AccessError::Malformed(e.to_string()))
}

/// Decode a MultiString payload into its segments.
///
/// Decoding stops at the first empty segment, which is the list terminator.
/// A payload missing its final terminators still yields its segments.
pub fn decode_multi(bytes: &[u8]) -> AccessResult<Vec<String>> {
    let units = to_units(bytes)?;
    units
        .split(|&u| u == TERMINATOR)
        .take_while(|segment| !segment.is_empty())
        .map(|segment| String::from_utf16(segment).map_err(|e| AccessError::Malformed(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TrackingAllocator;
    use proptest::prelude::*;

    fn units_of(buf: &[u8]) -> Vec<u16> {
        to_units(buf).unwrap()
    }

    #[test]
    fn unterminated_text_gets_one_terminator() {
        let alloc = TrackingAllocator::new();
        let buf = encode_terminated("abc".encode_utf16(), &alloc).unwrap();
        assert_eq!(units_of(&buf), vec![0x61, 0x62, 0x63, 0]);
    }

    #[test]
    fn terminated_text_is_written_as_is() {
        let alloc = TrackingAllocator::new();
        let units = [0x61u16, 0x62, 0];
        let buf = encode_terminated(units.iter().copied(), &alloc).unwrap();
        assert_eq!(units_of(&buf), units.to_vec());
    }

    #[test]
    fn empty_text_is_a_lone_terminator() {
        let alloc = TrackingAllocator::new();
        let buf = encode_terminated("".encode_utf16(), &alloc).unwrap();
        assert_eq!(&buf[..], &[0, 0]);
    }

    #[test]
    fn multi_string_layout() {
        let alloc = TrackingAllocator::new();
        let buf = encode_multi(&["ab", "c"], &alloc).unwrap();
        assert_eq!(units_of(&buf), vec![0x61, 0x62, 0, 0x63, 0, 0]);

        let single = encode_multi(&["x"], &alloc).unwrap();
        assert_eq!(units_of(&single), vec![0x78, 0, 0]);

        let empty = encode_multi::<&str>(&[], &alloc).unwrap();
        assert_eq!(units_of(&empty), vec![0]);
    }

    #[test]
    fn multi_string_rejects_bad_segments() {
        let alloc = TrackingAllocator::new();
        assert!(matches!(
            encode_multi(&["a", ""], &alloc),
            Err(AccessError::InvalidValue(_))
        ));
        assert!(matches!(
            encode_multi(&["a\0b"], &alloc),
            Err(AccessError::InvalidValue(_))
        ));
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn decode_strips_only_one_terminator() {
        let bytes = [0x61, 0, 0, 0, 0, 0];
        assert_eq!(decode_string(&bytes).unwrap(), "a\0");
        assert_eq!(decode_string(&[0x61, 0]).unwrap(), "a");
        assert_eq!(decode_string(&[]).unwrap(), "");
    }

    #[test]
    fn decode_rejects_odd_and_invalid_payloads() {
        assert!(matches!(decode_string(&[0x61]), Err(AccessError::Malformed(_))));
        // Lone high surrogate.
        assert!(matches!(
            decode_string(&[0x00, 0xd8]),
            Err(AccessError::Malformed(_))
        ));
    }

    #[test]
    fn decode_multi_stops_at_list_terminator() {
        let alloc = TrackingAllocator::new();
        let buf = encode_multi(&["one", "two"], &alloc).unwrap();
        assert_eq!(decode_multi(&buf).unwrap(), vec!["one", "two"]);

        // Single-segment payload without the list terminator.
        assert_eq!(decode_multi(&[0x61, 0, 0, 0]).unwrap(), vec!["a"]);
        assert!(decode_multi(&[0, 0]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn terminated_roundtrip(text in "[^\\x00]{0,64}") {
            let alloc = TrackingAllocator::new();
            let buf = encode_terminated(text.encode_utf16(), &alloc).unwrap();
            prop_assert_eq!(buf.len(), (text.encode_utf16().count() + 1) * 2);
            prop_assert_eq!(decode_string(&buf).unwrap(), text);
        }

        #[test]
        fn multi_roundtrip(segments in proptest::collection::vec("[^\\x00]{1,16}", 0..6)) {
            let alloc = TrackingAllocator::new();
            let buf = encode_multi(&segments, &alloc).unwrap();
            prop_assert_eq!(decode_multi(&buf).unwrap(), segments);
        }
    }
}
