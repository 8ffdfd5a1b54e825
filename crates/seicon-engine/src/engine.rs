use std::sync::{Arc, RwLock};

use seicon_cache::{IconConsumer, IconHandler};
use seicon_store::ResourceHandle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::icon::IconBinding;
use crate::url::{EngineUrl, UrlType};

const DEFAULT_CHARSET: &str = "UTF-8";
const EVENT_CAPACITY: usize = 16;

/// Notifications emitted by an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine was rebuilt from a new configuration.
    Changed,
    /// A newer icon was installed.
    IconChanged,
}

/// Minimal persisted record of an application-provided engine.
///
/// The full definition always comes from the configuration, so only the
/// identity and user metadata are saved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub id: String,
    #[serde(rename = "_name")]
    pub name: String,
    #[serde(rename = "_isAppProvided")]
    pub is_app_provided: bool,
    #[serde(rename = "_metaData", default)]
    pub meta_data: Map<String, Value>,
}

/// Fields derived from an [`EngineConfig`]; rebuilt as a whole on update.
#[derive(Clone, Debug)]
struct EngineDetails {
    name: String,
    telemetry_id: String,
    aliases: Vec<String>,
    general_purpose: bool,
    order_hint: Option<i64>,
    query_charset: String,
    click_url: Option<String>,
    urls: Vec<EngineUrl>,
}

impl EngineDetails {
    fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let telemetry_id = match &config.telemetry_suffix {
            Some(suffix) if !suffix.is_empty() => format!("{}-{suffix}", config.identifier),
            _ => config.identifier.clone(),
        };

        let mut urls = Vec::with_capacity(config.urls.len());
        for (key, url) in &config.urls {
            if let Some(url) = EngineUrl::from_config(key, url, config.partner_code.as_deref())? {
                urls.push(url);
            }
        }

        Ok(Self {
            name: config.name.trim().to_string(),
            telemetry_id,
            aliases: config.aliases.iter().map(|a| format!("@{a}")).collect(),
            general_purpose: config.classification.as_deref() == Some("general"),
            order_hint: config.order_hint,
            query_charset: config
                .charset
                .clone()
                .unwrap_or_else(|| DEFAULT_CHARSET.to_string()),
            click_url: config.click_url.clone(),
            urls,
        })
    }
}

/// A search engine defined by the application's search configuration.
pub struct AppProvidedEngine {
    id: String,
    configuration_id: String,
    extension_id: String,
    locale: String,
    details: RwLock<EngineDetails>,
    meta_data: RwLock<Map<String, Value>>,
    icon: IconBinding,
    events: broadcast::Sender<EngineEvent>,
}

impl AppProvidedEngine {
    /// Build an engine from its configuration, restoring saved metadata.
    pub fn new(
        config: &EngineConfig,
        settings: Option<&EngineSettings>,
        icons: Arc<IconHandler>,
    ) -> EngineResult<Arc<Self>> {
        let details = EngineDetails::from_config(config)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Arc::new(Self {
            id: format!("{}{}", config.web_extension.id, config.web_extension.locale),
            configuration_id: config.identifier.clone(),
            extension_id: config.web_extension.id.clone(),
            locale: config.web_extension.locale.clone(),
            details: RwLock::new(details),
            meta_data: RwLock::new(settings.map(|s| s.meta_data.clone()).unwrap_or_default()),
            icon: IconBinding::new(config.identifier.clone(), icons),
            events,
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier from the configuration; icons are matched against it.
    pub fn configuration_id(&self) -> &str {
        &self.configuration_id
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn load_path(&self) -> String {
        format!("[app]{}", self.extension_id)
    }

    pub fn is_app_provided(&self) -> bool {
        true
    }

    /// Application-provided engines are rebuilt from configuration on every
    /// start; only [`to_json`](Self::to_json) is persisted.
    pub fn in_memory(&self) -> bool {
        true
    }

    pub fn name(&self) -> String {
        self.details.read().expect("lock poisoned").name.clone()
    }

    pub fn telemetry_id(&self) -> String {
        self.details.read().expect("lock poisoned").telemetry_id.clone()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.details.read().expect("lock poisoned").aliases.clone()
    }

    /// Whether the engine searches the web in general rather than serving a
    /// specific purpose such as shopping.
    pub fn is_general_purpose(&self) -> bool {
        self.details.read().expect("lock poisoned").general_purpose
    }

    pub fn order_hint(&self) -> Option<i64> {
        self.details.read().expect("lock poisoned").order_hint
    }

    pub fn query_charset(&self) -> String {
        self.details.read().expect("lock poisoned").query_charset.clone()
    }

    pub fn click_url(&self) -> Option<String> {
        self.details.read().expect("lock poisoned").click_url.clone()
    }

    pub fn urls(&self) -> Vec<EngineUrl> {
        self.details.read().expect("lock poisoned").urls.clone()
    }

    pub fn url(&self, url_type: UrlType) -> Option<EngineUrl> {
        self.details
            .read()
            .expect("lock poisoned")
            .urls
            .iter()
            .find(|u| u.url_type() == url_type)
            .cloned()
    }

    pub fn meta_data(&self, key: &str) -> Option<Value> {
        self.meta_data.read().expect("lock poisoned").get(key).cloned()
    }

    pub fn set_meta_data(&self, key: impl Into<String>, value: Value) {
        self.meta_data
            .write()
            .expect("lock poisoned")
            .insert(key.into(), value);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// The engine's icon, resolved on first use and shared afterwards.
    pub async fn get_icon_url(&self, preferred_width: u32) -> Option<ResourceHandle> {
        self.icon.get_resource(preferred_width).await
    }

    pub fn icon(&self) -> &IconBinding {
        &self.icon
    }

    /// Release the icon. Called when the engine is removed.
    pub fn cleanup(&self) {
        self.icon.release();
    }

    /// Rebuild the engine from a new configuration.
    ///
    /// On error the engine keeps its previous definition.
    pub fn update(&self, config: &EngineConfig) -> EngineResult<()> {
        let details = EngineDetails::from_config(config)?;
        *self.details.write().expect("lock poisoned") = details;
        debug!(engine = %self.id, "engine updated");
        self.notify(EngineEvent::Changed);
        Ok(())
    }

    /// Apply `config` only if it keeps the engine's name. Returns whether the
    /// update was applied.
    pub fn update_if_no_name_change(&self, config: &EngineConfig) -> EngineResult<bool> {
        if self.name() != config.name.trim() {
            return Ok(false);
        }
        self.update(config)?;
        Ok(true)
    }

    /// The settings record persisted for this engine.
    pub fn to_settings(&self) -> EngineSettings {
        EngineSettings {
            id: self.id.clone(),
            name: self.name(),
            is_app_provided: true,
            meta_data: self.meta_data.read().expect("lock poisoned").clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        let settings = self.to_settings();
        serde_json::json!({
            "id": settings.id,
            "_name": settings.name,
            "_isAppProvided": settings.is_app_provided,
            "_metaData": settings.meta_data,
        })
    }

    fn notify(&self, event: EngineEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

impl IconConsumer for AppProvidedEngine {
    fn identifier(&self) -> &str {
        &self.configuration_id
    }

    fn update_icon(&self, handle: ResourceHandle) {
        if self.icon.update_resource(handle) {
            self.notify(EngineEvent::IconChanged);
        }
    }
}

impl std::fmt::Debug for AppProvidedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppProvidedEngine")
            .field("id", &self.id)
            .field("configuration_id", &self.configuration_id)
            .field("name", &self.name())
            .finish()
    }
}
