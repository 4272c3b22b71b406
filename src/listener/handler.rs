//! The user-supplied vote handler.

use std::future::Future;

use async_trait::async_trait;

use crate::vote::Vote;

/// Receives every vote accepted by the listener.
///
/// The listener awaits `handle_vote` before replying: `Ok` becomes 200 and
/// `Err` becomes 500. Calls are not serialized, so implementations must
/// tolerate concurrent invocations.
///
/// Async closures implement this trait directly:
///
/// ```
/// use diffcord::listener::VoteHandler;
/// use diffcord::vote::Vote;
///
/// fn assert_handler(_: impl VoteHandler) {}
///
/// assert_handler(|vote: Vote| async move {
///     println!("{} voted", vote.user_id());
///     Ok::<_, anyhow::Error>(())
/// });
/// ```
#[async_trait]
pub trait VoteHandler: Send + Sync {
    /// Processes one vote.
    async fn handle_vote(&self, vote: Vote) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> VoteHandler for F
where
    F: Fn(Vote) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle_vote(&self, vote: Vote) -> anyhow::Result<()> {
        self(vote).await
    }
}
