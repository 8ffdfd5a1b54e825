use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Configuration of one application-provided engine, as distributed by the
/// search configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Configuration identifier; icon records are matched against it.
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub partner_code: Option<String>,
    #[serde(default)]
    pub telemetry_suffix: Option<String>,
    #[serde(default)]
    pub click_url: Option<String>,
    #[serde(default)]
    pub order_hint: Option<i64>,
    pub web_extension: WebExtension,
    /// URL definitions keyed by url type, in declaration order.
    #[serde(default)]
    pub urls: IndexMap<String, UrlConfig>,
}

impl EngineConfig {
    pub fn from_json(s: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebExtension {
    pub id: String,
    pub locale: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlConfig {
    pub base: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamConfig>,
    /// Name of the query parameter carrying the search terms.
    #[serde(default)]
    pub search_term_param_name: Option<String>,
}

/// One query parameter definition. The kind is decided by which value field
/// is present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamConfig {
    /// A literal value; `{partnerCode}` is replaced by the engine's partner code.
    Value { name: String, value: String },
    /// A value read from the named preference at submission time.
    ExperimentConfig {
        name: String,
        #[serde(rename = "experimentConfig")]
        experiment_config: String,
    },
    /// One value per search access point.
    SearchAccessPoint {
        name: String,
        #[serde(rename = "searchAccessPoint")]
        search_access_point: IndexMap<String, String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = EngineConfig::from_json(
            r#"{
                "identifier": "shopify-en",
                "name": " Shopify ",
                "aliases": ["shop"],
                "classification": "unknown",
                "partnerCode": "pc1",
                "webExtension": { "id": "shopify@search", "locale": "en" },
                "urls": {
                    "search": {
                        "base": "https://shop.example/search",
                        "params": [
                            { "name": "pc", "value": "{partnerCode}" },
                            { "name": "exp", "experimentConfig": "shop.exp" },
                            { "name": "src", "searchAccessPoint": { "addressbar": "ab", "searchbar": "sb" } }
                        ],
                        "searchTermParamName": "q"
                    },
                    "suggestions": { "base": "https://shop.example/suggest?q={searchTerms}" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.identifier, "shopify-en");
        assert_eq!(config.partner_code.as_deref(), Some("pc1"));
        assert_eq!(config.web_extension.locale, "en");
        let keys: Vec<&str> = config.urls.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["search", "suggestions"]);

        let params = &config.urls["search"].params;
        assert!(matches!(params[0], ParamConfig::Value { .. }));
        assert!(matches!(params[1], ParamConfig::ExperimentConfig { .. }));
        match &params[2] {
            ParamConfig::SearchAccessPoint {
                search_access_point,
                ..
            } => assert_eq!(search_access_point.len(), 2),
            other => panic!("unexpected param {other:?}"),
        }
    }

    #[test]
    fn minimal_config_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "identifier": "x", "name": "X", "webExtension": { "id": "x@search", "locale": "default" } }"#,
        )
        .unwrap();
        assert!(config.aliases.is_empty());
        assert!(config.urls.is_empty());
        assert!(config.classification.is_none());
    }

    #[test]
    fn rejects_missing_identifier() {
        assert!(EngineConfig::from_json(r#"{ "name": "X" }"#).is_err());
    }
}
