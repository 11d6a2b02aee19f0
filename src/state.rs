//! Process-wide application state.

use std::sync::Arc;

use crate::config::GlobalConfig;
use crate::dedup::DedupStore;
use crate::model::ImageModel;
use crate::slack::client::ReplyPoster;
use crate::storage::ImageStore;

/// Shared context constructed once at startup and passed into the handler.
///
/// Holds the loaded configuration (secrets included) and the four external
/// service ports. The hosting process recycles it wholesale; there is no
/// teardown path.
pub struct AppState {
    /// Loaded configuration including runtime secrets.
    pub config: Arc<GlobalConfig>,
    /// Deduplication store.
    pub dedup: Arc<dyn DedupStore>,
    /// Generative-image model.
    pub model: Arc<dyn ImageModel>,
    /// Image object store.
    pub store: Arc<dyn ImageStore>,
    /// Outbound reply delivery.
    pub slack: Arc<dyn ReplyPoster>,
}
