//! Synchronous user event dispatch

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::user::{UserEvent, UserEventListener, UserEventPublisher};
use crate::domain::DomainError;

/// Publisher that hands each event to its listeners in registration order
///
/// A failing listener is logged and skipped; the remaining listeners still
/// receive the event.
#[derive(Debug, Default)]
pub struct UserEventNotifier {
    listeners: Vec<Arc<dyn UserEventListener>>,
}

impl UserEventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, listener: Arc<dyn UserEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl UserEventPublisher for UserEventNotifier {
    async fn publish(&self, event: UserEvent) {
        for listener in &self.listeners {
            if let Err(e) = listener.on_event(&event).await {
                warn!(
                    event = %event.kind(),
                    listener = ?listener,
                    error = %e,
                    "User event listener failed"
                );
            }
        }
    }
}

/// Listener that writes one structured log record per event
#[derive(Debug, Clone, Default)]
pub struct LoggingUserListener;

impl LoggingUserListener {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UserEventListener for LoggingUserListener {
    async fn on_event(&self, event: &UserEvent) -> Result<(), DomainError> {
        let user = event.user();
        let user_id = user.id().map(|id| id.value());

        match event {
            UserEvent::Created(_) => {
                info!(user_id, name = user.name(), email = user.email(), "User created")
            }
            UserEvent::Updated(_) => {
                info!(user_id, name = user.name(), email = user.email(), "User updated")
            }
            UserEvent::Deleted(_) => info!(
                user_id,
                name = user.name(),
                email = user.email(),
                deleted = ?user.deleted(),
                "User deleted"
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{User, UserEventKind};
    use std::sync::Mutex;

    /// Listener recording what it receives, optionally failing every call
    #[derive(Debug, Default)]
    struct RecordingListener {
        seen: Mutex<Vec<UserEventKind>>,
        fail: bool,
    }

    impl RecordingListener {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn seen(&self) -> Vec<UserEventKind> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserEventListener for RecordingListener {
        async fn on_event(&self, event: &UserEvent) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(event.kind());

            if self.fail {
                return Err(DomainError::storage("listener backend unavailable"));
            }

            Ok(())
        }
    }

    fn test_user() -> User {
        User::new("johndoe123", "john@example.com", None)
    }

    #[tokio::test]
    async fn test_publish_reaches_all_listeners_in_order() {
        let first = Arc::new(RecordingListener::default());
        let second = Arc::new(RecordingListener::default());
        let notifier = UserEventNotifier::new()
            .with_listener(first.clone())
            .with_listener(second.clone());

        notifier.publish(UserEvent::Created(test_user())).await;
        notifier.publish(UserEvent::Deleted(test_user())).await;

        assert_eq!(notifier.listener_count(), 2);
        assert_eq!(first.seen(), vec![UserEventKind::Created, UserEventKind::Deleted]);
        assert_eq!(second.seen(), vec![UserEventKind::Created, UserEventKind::Deleted]);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_others() {
        let failing = Arc::new(RecordingListener::failing());
        let healthy = Arc::new(RecordingListener::default());
        let notifier = UserEventNotifier::new()
            .with_listener(failing.clone())
            .with_listener(healthy.clone());

        notifier.publish(UserEvent::Updated(test_user())).await;

        assert_eq!(failing.seen(), vec![UserEventKind::Updated]);
        assert_eq!(healthy.seen(), vec![UserEventKind::Updated]);
    }

    #[tokio::test]
    async fn test_publish_without_listeners() {
        let notifier = UserEventNotifier::new();
        notifier.publish(UserEvent::Created(test_user())).await;
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_logging_listener_never_fails() {
        let listener = LoggingUserListener::new();
        let mut user = test_user();

        assert!(listener.on_event(&UserEvent::Created(user.clone())).await.is_ok());
        assert!(listener.on_event(&UserEvent::Updated(user.clone())).await.is_ok());

        user.set_deleted(chrono::Utc::now()).unwrap();
        assert!(listener.on_event(&UserEvent::Deleted(user)).await.is_ok());
    }
}
