//! Invite code generation.

use rand::{Rng, rng};

/// Lowercase base-36 alphabet the codes are drawn from.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
/// Length of one independently generated segment.
const SEGMENT_LENGTH: usize = 12;

/// Produce a fresh opaque invite code.
///
/// Two independently generated 12-character base-36 segments concatenated,
/// roughly 124 bits of entropy. Codes carry no relation to team ids or
/// creation time; uniqueness is ultimately enforced by the store's unique
/// index, with the service regenerating on a reported collision.
pub fn generate() -> String {
    let mut code = segment();
    code.push_str(&segment());
    code
}

fn segment() -> String {
    let mut generator = rng();
    (0..SEGMENT_LENGTH)
        .map(|_| ALPHABET[generator.random_range(0..ALPHABET.len())] as char)
        .collect()
}
