//! Content relocator contract.

use crate::Error;
use async_trait::async_trait;
use url::Url;

/// Whether a deposited object is publicly readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Fetches content from its origin and deposits a durable copy into the
/// destination object store.
///
/// `relocate` retrieves the content addressed by `source` and stores it
/// under `destination` within the relocator's fixed namespace, returning a
/// caller-resolvable reference to the deposited object. Fetch, deposit,
/// and quota/permission failures are all opaque to the orchestrator beyond
/// "relocation failed".
#[async_trait]
pub trait Relocator: Send + Sync {
    async fn relocate(&self, source: &Url, destination: &str, visibility: Visibility) -> Result<String, Error>;
}
