use tokio::sync::broadcast::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Error(String),
    Warning(String),
    Info(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Error(message)
            | Notification::Warning(message)
            | Notification::Info(message) => message,
        }
    }
}

#[derive(Debug)]
pub struct NotificationBroadcast {
    tx: Sender<Notification>,
}

impl NotificationBroadcast {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(20);
        Self { tx }
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Nobody listening is not an error for fire-and-forget messages.
    pub fn send_error(&self, message: String) {
        tracing::error!("{message}");
        _ = self.tx.send(Notification::Error(message));
    }

    pub fn send_warning(&self, message: String) {
        tracing::warn!("{message}");
        _ = self.tx.send(Notification::Warning(message));
    }

    pub fn send_info(&self, message: String) {
        tracing::info!("{message}");
        _ = self.tx.send(Notification::Info(message));
    }
}

impl Default for NotificationBroadcast {
    fn default() -> Self {
        Self::new()
    }
}
