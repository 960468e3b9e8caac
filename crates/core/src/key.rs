//! Deterministic destination naming for relocated content.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the destination object name for a canonical origin URL.
///
/// The name is the SHA-256 digest of the canonical origin string, prefixed
/// with the lowercased host so objects group by site in the destination
/// namespace. The result is a pure function of the origin: repeated
/// relocation attempts for the same origin always target the same object,
/// which is what keeps concurrent or retried relocations idempotent at the
/// storage layer.
pub fn destination_name(origin: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(origin.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());

    match origin.host_str() {
        Some(host) => format!("{host}/{digest}"),
        None => digest,
    }
}
