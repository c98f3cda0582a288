//! The runtime contract every constructed config source satisfies

use crate::{Params, Result, Retrieved};
use async_trait::async_trait;

/// A live, named configuration source.
///
/// Sources are shared across callers, so both operations take `&self` and
/// may run concurrently for distinct selectors.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Retrieve the value addressed by `selector`, using `params` where the
    /// source supports them.
    async fn retrieve(&self, selector: &str, params: &Params) -> Result<Retrieved>;

    /// End the session. Releases every blocked watcher and tears down
    /// background work. Closing twice is a no-op.
    async fn close(&self) -> Result<()>;
}
