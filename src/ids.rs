//! Random identifier generation for shares and drop-box requests.

use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of share and drop-box request ids.
pub const SHARE_ID_LEN: usize = 12;

/// Length of public drop-box tokens. Longer than ids so the id namespace
/// is not enumerable via the token namespace.
pub const DROPBOX_TOKEN_LEN: usize = 16;

/// Generate a random alphanumeric identifier of the given length.
pub fn random_id(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
