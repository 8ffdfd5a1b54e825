use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use seicon_cache::{ConsumerRegistry, IconConsumer};

use crate::engine::AppProvidedEngine;

/// Tracks the application-provided engines that are currently alive.
///
/// Engines are held weakly: dropping the last strong reference to an engine
/// removes it from the registry.
#[derive(Default)]
pub struct EngineRegistry {
    engines: RwLock<Vec<Weak<AppProvidedEngine>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, engine: &Arc<AppProvidedEngine>) {
        let mut engines = self.engines.write().expect("lock poisoned");
        engines.retain(|e| e.strong_count() > 0);
        engines.push(Arc::downgrade(engine));
    }

    /// Remove the engine with `id`. Returns `true` if it was registered.
    pub fn remove(&self, id: &str) -> bool {
        let mut engines = self.engines.write().expect("lock poisoned");
        let before = engines.len();
        engines.retain(|e| e.upgrade().is_some_and(|engine| engine.id() != id));
        engines.len() != before
    }

    /// Live engines in registration order.
    pub fn engines(&self) -> Vec<Arc<AppProvidedEngine>> {
        self.engines
            .read()
            .expect("lock poisoned")
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Arc<AppProvidedEngine>> {
        self.engines().into_iter().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.engines().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConsumerRegistry for EngineRegistry {
    async fn live_consumers(&self) -> Vec<Arc<dyn IconConsumer>> {
        self.engines()
            .into_iter()
            .map(|e| e as Arc<dyn IconConsumer>)
            .collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::EngineEvent;
    use bytes::Bytes;
    use seicon_cache::{IconCacheConfig, IconHandler, IconServices};
    use seicon_idle::ManualIdleDetector;
    use seicon_remote::InMemoryCollection;
    use seicon_store::{AttachmentStore, CachedAttachment, HandleRegistry, InMemoryAttachmentStore};
    use seicon_types::{AttachmentMeta, IconRecord, RecordChanges, RecordUpdate};

    fn engine_config(identifier: &str) -> EngineConfig {
        EngineConfig::from_json(&format!(
            r#"{{
                "identifier": "{identifier}",
                "name": "{identifier}",
                "webExtension": {{ "id": "{identifier}@search", "locale": "default" }},
                "urls": {{ "search": {{ "base": "https://{identifier}.example/?q={{searchTerms}}" }} }}
            }}"#
        ))
        .unwrap()
    }

    struct Fixture {
        registry: Arc<EngineRegistry>,
        handler: Arc<IconHandler>,
        collection: Arc<InMemoryCollection>,
        store: Arc<InMemoryAttachmentStore>,
        idle: Arc<ManualIdleDetector>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(EngineRegistry::new());
        let collection = Arc::new(InMemoryCollection::default());
        let store = Arc::new(InMemoryAttachmentStore::new());
        let idle = Arc::new(ManualIdleDetector::new());
        let handler = IconHandler::new(
            IconCacheConfig::default(),
            IconServices {
                remote: collection.clone(),
                store: store.clone(),
                handles: Arc::new(HandleRegistry::new()),
                idle: idle.clone(),
                consumers: registry.clone(),
            },
        );
        Fixture {
            registry,
            handler,
            collection,
            store,
            idle,
        }
    }

    impl Fixture {
        fn engine(&self, identifier: &str) -> Arc<AppProvidedEngine> {
            let engine =
                AppProvidedEngine::new(&engine_config(identifier), None, self.handler.clone())
                    .unwrap();
            self.registry.register(&engine);
            engine
        }
    }

    #[tokio::test]
    async fn dropped_engines_are_not_live() {
        let f = fixture();
        let a = f.engine("shopify");
        let b = f.engine("google");
        assert_eq!(f.registry.len(), 2);
        assert_eq!(f.registry.live_consumers().await.len(), 2);

        drop(b);
        assert_eq!(f.registry.len(), 1);
        assert_eq!(f.registry.get(a.id()).unwrap().id(), a.id());

        assert!(f.registry.remove(a.id()));
        assert!(f.registry.is_empty());
        assert!(!f.registry.remove(a.id()));
    }

    #[tokio::test]
    async fn pushed_icon_reaches_bound_engine() {
        let f = fixture();
        let v1 = IconRecord::new("a", ["shop*"], 16, AttachmentMeta::new("image/png"), 1);
        let v2 = IconRecord::new("a", ["shop*"], 16, AttachmentMeta::new("image/png"), 2);
        f.collection.insert_record(v1.clone());
        f.store
            .put(CachedAttachment::new(v1.clone(), Bytes::from_static(b"v1")))
            .await
            .unwrap();

        let shopify = f.engine("shopify");
        let google = f.engine("google");
        let mut shopify_events = shopify.subscribe();
        let mut google_events = google.subscribe();

        let old = shopify.get_icon_url(16).await.unwrap();
        assert_eq!(&old.bytes()[..], b"v1");

        f.collection.insert_record(v2.clone());
        f.collection.set_attachment("a", &b"v2"[..]);
        f.handler
            .on_remote_change(&RecordChanges::updated(vec![RecordUpdate::new(v1, v2)]))
            .await;
        assert!(f.idle.fire().await);

        assert_eq!(shopify_events.try_recv().unwrap(), EngineEvent::IconChanged);
        assert!(shopify_events.try_recv().is_err());
        assert!(google_events.try_recv().is_err());

        let new = shopify.get_icon_url(16).await.unwrap();
        assert_eq!(&new.bytes()[..], b"v2");
        assert!(!f.handler.handles().is_live(&old));
        assert_eq!(f.handler.handles().live_count(), 1);
    }
}
