//! Typed notifications between the shared state, the views and the app
//!
//! Subscribers register a closure for one concrete event type. Handlers
//! run synchronously on the publishing thread and must not publish.

use std::any::{Any, TypeId};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// Marker for types that can travel over the [`EventBus`]
pub trait Event: Any + Send + Sync {}

type Handler = Box<dyn FnMut(&dyn Any) + Send + Sync>;

/// A new row set replaced the current one
#[derive(Debug, Clone)]
pub struct DatasetLoaded {
    pub source_name: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// The current row set was reset to empty
#[derive(Debug, Clone)]
pub struct DatasetCleared {
    pub reason: String,
}

/// An upload was rejected locally or by the server
#[derive(Debug, Clone)]
pub struct UploadFailed {
    pub file_name: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct WidgetAdded {
    pub widget_id: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct WidgetRemoved {
    pub widget_id: String,
}

/// Widget rectangles changed after a drag, resize, add or delete
#[derive(Debug, Clone)]
pub struct LayoutChanged {
    pub widget_count: usize,
}

impl Event for DatasetLoaded {}
impl Event for DatasetCleared {}
impl Event for UploadFailed {}
impl Event for WidgetAdded {}
impl Event for WidgetRemoved {}
impl Event for LayoutChanged {}

#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, Vec<Handler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for every published `E`
    pub fn subscribe<E, F>(&self, mut handler: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        let erased: Handler = Box::new(move |event| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event);
            }
        });
        self.handlers
            .lock()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(erased);
    }

    pub fn publish<E: Event>(&self, event: E) {
        let mut handlers = self.handlers.lock();
        let Some(subscribers) = handlers.get_mut(&TypeId::of::<E>()) else {
            tracing::trace!("No subscribers for {}", std::any::type_name::<E>());
            return;
        };
        for handler in subscribers.iter_mut() {
            handler(&event as &dyn Any);
        }
    }

    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_only_matching_subscribers() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.subscribe(move |loaded: &DatasetLoaded| sink.lock().push(loaded.row_count));

        bus.publish(DatasetLoaded {
            source_name: "trials.csv".into(),
            row_count: 12,
            column_count: 8,
        });
        bus.publish(WidgetRemoved { widget_id: "w1".into() });

        assert_eq!(*seen.lock(), vec![12]);
        assert_eq!(bus.subscriber_count::<DatasetLoaded>(), 1);
        assert_eq!(bus.subscriber_count::<WidgetRemoved>(), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let bus = EventBus::new();
        let failures = Arc::new(Mutex::new(0));

        let counter = failures.clone();
        bus.clone().subscribe(move |_: &UploadFailed| *counter.lock() += 1);
        bus.publish(UploadFailed {
            file_name: "notes.txt".into(),
            message: "Unsupported file".into(),
        });

        assert_eq!(*failures.lock(), 1);
    }
}
