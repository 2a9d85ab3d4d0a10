//! Key codec: log indices and stable integer values as fixed-width
//! big-endian bytes.
//!
//! Log keys and stable keys live in disjoint namespaces, each opened by a
//! single tag byte. Keeping the namespaces disjoint means a caller-chosen
//! 8-byte stable key can never collide with a real log index key.


use crate::ConvertError;

/// Namespace tag for log-entry keys.
pub const LOG_NAMESPACE: u8 = 0x01;
/// Namespace tag for stable key/value facts.
pub const STABLE_NAMESPACE: u8 = 0x02;

/// Length of an encoded log key: namespace byte + 8-byte index.
pub const LOG_KEY_LEN: usize = 9;

/// Encodes a log index as its ordered storage key.
///
/// Big-endian within a fixed namespace, so for indices `a < b` the encoded
/// keys compare `encode(a) < encode(b)` byte-lexicographically. First/last
/// index queries rely on this.
#[inline]
pub const fn index_to_key(index: u64) -> [u8; LOG_KEY_LEN] {
    let be = index.to_be_bytes();
    [
        LOG_NAMESPACE,
        be[0],
        be[1],
        be[2],
        be[3],
        be[4],
        be[5],
        be[6],
        be[7],
    ]
}

/// Decodes a storage key back into a log index.
///
/// Only this codec writes log keys, so a malformed key signals on-disk
/// damage rather than a caller mistake.
pub fn key_to_index<K: AsRef<[u8]>>(key: K) -> Result<u64, ConvertError> {
    let key = key.as_ref();
    if key.len() != LOG_KEY_LEN {
        return Err(ConvertError::MalformedKey {
            expected: LOG_KEY_LEN,
            found: key.len(),
        });
    }
    if key[0] != LOG_NAMESPACE {
        return Err(ConvertError::WrongNamespace {
            expected: LOG_NAMESPACE,
            found: key[0],
        });
    }
    let array: [u8; 8] = key[1..].try_into().expect("Guaranteed safe after length check");
    Ok(u64::from_be_bytes(array))
}

/// Prefixes a caller-supplied stable key with its namespace tag.
pub fn stable_key(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + 1);
    out.push(STABLE_NAMESPACE);
    out.extend_from_slice(key);
    out
}

/// Encodes a `u64` stable value as 8 big-endian bytes.
#[inline]
pub const fn u64_to_bytes(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decodes an 8-byte big-endian stable value.
pub fn bytes_to_u64<V: AsRef<[u8]>>(bytes: V) -> Result<u64, ConvertError> {
    let bytes = bytes.as_ref();
    if bytes.len() != 8 {
        return Err(ConvertError::MalformedValue {
            expected: 8,
            found: bytes.len(),
        });
    }
    let array: [u8; 8] = bytes.try_into().expect("Guaranteed safe after length check");
    Ok(u64::from_be_bytes(array))
}
