//! Random token generation.

use rand::prelude::RngExt;
use rand::rng;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a string of `len` characters drawn uniformly from `[A-Za-z0-9]`.
pub fn random_string(len: usize) -> String {
    let mut rng = rng();
    (0..len)
        .map(|_| ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}
