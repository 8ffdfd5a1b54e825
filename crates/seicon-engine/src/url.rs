use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ParamConfig, UrlConfig};
use crate::error::{EngineError, EngineResult};

/// Placeholder replaced by the encoded search terms.
pub const SEARCH_TERMS: &str = "{searchTerms}";

/// Placeholder replaced by the engine's partner code when the url is built.
pub const PARTNER_CODE: &str = "{partnerCode}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlType {
    Search,
    Suggestions,
    Trending,
}

impl UrlType {
    /// Map a configuration key to a url type. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "search" => Some(Self::Search),
            "suggestions" => Some(Self::Suggestions),
            "trending" => Some(Self::Trending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Suggestions => "suggestions",
            Self::Trending => "trending",
        }
    }
}

impl fmt::Display for UrlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Literal(String),
    /// Read from the named preference; the param is omitted when unset.
    Preference(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlParam {
    pub name: String,
    pub value: ParamValue,
    /// Only sent for submissions made for this purpose.
    pub purpose: Option<String>,
}

/// A request ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub url: String,
    pub method: String,
    /// Form body for POST urls.
    pub body: Option<String>,
}

/// One url of an engine: a template plus query parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineUrl {
    url_type: UrlType,
    method: String,
    template: String,
    params: Vec<UrlParam>,
}

impl EngineUrl {
    pub fn new(url_type: UrlType, method: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            url_type,
            method: method.into(),
            template: template.into(),
            params: Vec::new(),
        }
    }

    /// Build a url from its configuration entry.
    ///
    /// Returns `Ok(None)` for url types this engine model does not know; they
    /// are skipped with a warning. A search or suggestions url must carry the
    /// search terms, either in its template or as a named parameter. The
    /// search terms parameter is always added last.
    pub fn from_config(
        key: &str,
        config: &UrlConfig,
        partner_code: Option<&str>,
    ) -> EngineResult<Option<Self>> {
        let Some(url_type) = UrlType::from_key(key) else {
            warn!(url_type = key, "unexpected engine url type");
            return Ok(None);
        };

        let method = config.method.as_deref().unwrap_or("GET");
        let mut url = Self::new(url_type, method, config.base.as_str());

        for param in &config.params {
            match param {
                ParamConfig::Value { name, value } => {
                    let value = if value == PARTNER_CODE {
                        partner_code.unwrap_or_default()
                    } else {
                        value.as_str()
                    };
                    url.add_param(name.as_str(), value, None);
                }
                ParamConfig::ExperimentConfig {
                    name,
                    experiment_config,
                } => url.add_preference_param(name.as_str(), experiment_config.as_str()),
                ParamConfig::SearchAccessPoint {
                    name,
                    search_access_point,
                } => {
                    for (point, value) in search_access_point {
                        let purpose = if point == "addressbar" { "keyword" } else { point.as_str() };
                        url.add_param(name.as_str(), value.as_str(), Some(purpose));
                    }
                }
            }
        }

        if config.search_term_param_name.is_none()
            && !config.base.contains(SEARCH_TERMS)
            && url_type != UrlType::Trending
        {
            return Err(EngineError::MissingSearchTerms { url_type });
        }
        if let Some(name) = &config.search_term_param_name {
            url.add_param(name.as_str(), SEARCH_TERMS, None);
        }

        Ok(Some(url))
    }

    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>, purpose: Option<&str>) {
        self.params.push(UrlParam {
            name: name.into(),
            value: ParamValue::Literal(value.into()),
            purpose: purpose.map(str::to_string),
        });
    }

    pub fn add_preference_param(&mut self, name: impl Into<String>, preference: impl Into<String>) {
        self.params.push(UrlParam {
            name: name.into(),
            value: ParamValue::Preference(preference.into()),
            purpose: None,
        });
    }

    pub fn url_type(&self) -> UrlType {
        self.url_type
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn params(&self) -> &[UrlParam] {
        &self.params
    }

    /// Build the request for `terms`.
    ///
    /// Params bound to a purpose are sent only when `purpose` matches.
    /// Preference params take their value from `preferences`.
    pub fn submission(
        &self,
        terms: &str,
        purpose: Option<&str>,
        preferences: &HashMap<String, String>,
    ) -> Submission {
        let encoded = urlencoding::encode(terms);
        let mut url = self.template.replace(SEARCH_TERMS, &encoded);

        let mut pairs = Vec::with_capacity(self.params.len());
        for param in &self.params {
            if param.purpose.is_some() && param.purpose.as_deref() != purpose {
                continue;
            }
            let value = match &param.value {
                ParamValue::Literal(value) => value.as_str(),
                ParamValue::Preference(pref) => match preferences.get(pref) {
                    Some(value) => value.as_str(),
                    None => continue,
                },
            };
            pairs.push(format!("{}={}", param.name, value.replace(SEARCH_TERMS, &encoded)));
        }
        let query = pairs.join("&");

        let body = if self.method.eq_ignore_ascii_case("POST") {
            Some(query)
        } else {
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
            None
        };

        Submission {
            url,
            method: self.method.clone(),
            body,
        }
    }
}
