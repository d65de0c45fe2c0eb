use async_trait::async_trait;
use crewline_bus::Subscription;
use tokio::sync::watch;

/// Handle to a running NATS subscription loop.
///
/// Shutting down stops the loop; dropping the merged subscribers then
/// unsubscribes on the wire.
#[derive(Clone, Debug)]
pub struct NatsSubscription {
    pub(crate) stop_sender: watch::Sender<()>,
}

#[async_trait]
impl Subscription for NatsSubscription {
    async fn shutdown(&self) {
        let _ = self.stop_sender.send(());
    }
}
