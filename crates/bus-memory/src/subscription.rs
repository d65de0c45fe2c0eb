use async_trait::async_trait;
use crewline_bus::Subscription;
use tokio::sync::watch;

/// Handle to a running in-memory subscription loop.
#[derive(Clone, Debug)]
pub struct MemorySubscription {
    pub(crate) stop_sender: watch::Sender<()>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn shutdown(&self) {
        let _ = self.stop_sender.send(());
    }
}
