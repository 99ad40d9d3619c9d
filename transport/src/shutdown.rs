use async_broadcast::TryRecvError;

/// Owned by whoever starts a node; dropping or calling [`shutdown`] wakes
/// every clone of the matching [`ShutdownReceiver`] — the accept loop, the
/// routing-table sweep, and the storage TTL sweep all observe the same
/// signal (§5).
pub struct ShutdownSender(async_broadcast::Sender<()>);

impl ShutdownSender {
    pub fn new() -> Self {
        let (mut sender, _receiver) = async_broadcast::broadcast(1);
        // There should always be only one shutdown signal in flight.
        sender.set_overflow(true);
        ShutdownSender(sender)
    }

    pub fn shutdown(&self) {
        let _ = self.0.try_broadcast(());
    }

    pub fn subscribe(&self) -> ShutdownReceiver {
        ShutdownReceiver(Some(self.0.new_receiver()))
    }
}

impl Default for ShutdownSender {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ShutdownReceiver(Option<async_broadcast::Receiver<()>>);

impl ShutdownReceiver {
    /// Resolves once a shutdown has been signalled (or the sender was
    /// dropped); resolves immediately on every call after the first.
    pub async fn recv(&mut self) {
        if let Some(x) = self.0.as_mut() {
            let _ = x.recv().await;
            self.0 = None;
        }
    }

    pub fn try_recv(&mut self) -> bool {
        if let Some(x) = self.0.as_mut() {
            if x.try_recv() == Err(TryRecvError::Empty) {
                return false;
            }
            self.0 = None;
        }
        true
    }
}
