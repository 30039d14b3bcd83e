use anyhow::{anyhow, bail};
use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_BACKEND: &str = "ROLLCALL_STORE_BACKEND";
pub const ENV_URL: &str = "ROLLCALL_STORE_URL";
pub const ENV_STORE_ID: &str = "ROLLCALL_STORE_ID";
pub const ENV_RELAY_URL: &str = "ROLLCALL_RELAY_URL";
pub const ENV_LOCAL_PATH: &str = "ROLLCALL_LOCAL_PATH";
pub const ENV_LOG: &str = "ROLLCALL_LOG";

/// Which record store the gateway talks to. Accepted as `store.connect`
/// params and read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Http {
        url: String,
        #[serde(rename = "storeId")]
        store_id: String,
        #[serde(default, rename = "relayUrl")]
        relay_url: Option<String>,
    },
    Local {
        path: PathBuf,
    },
}

impl StoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreConfig::Http {
                relay_url: Some(_), ..
            } => "relay",
            StoreConfig::Http { .. } => "http",
            StoreConfig::Local { .. } => "local",
        }
    }

    pub fn from_env() -> anyhow::Result<Option<StoreConfig>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `Ok(None)` when no backend is configured.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Option<StoreConfig>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let Some(backend) = get(ENV_BACKEND) else {
            return Ok(None);
        };
        match backend.trim().to_ascii_lowercase().as_str() {
            "http" => {
                let url = get(ENV_URL).ok_or_else(|| anyhow!("{ENV_URL} is required"))?;
                let store_id =
                    get(ENV_STORE_ID).ok_or_else(|| anyhow!("{ENV_STORE_ID} is required"))?;
                Ok(Some(StoreConfig::Http {
                    url,
                    store_id,
                    relay_url: get(ENV_RELAY_URL),
                }))
            }
            "local" => {
                let path =
                    get(ENV_LOCAL_PATH).ok_or_else(|| anyhow!("{ENV_LOCAL_PATH} is required"))?;
                Ok(Some(StoreConfig::Local {
                    path: PathBuf::from(path),
                }))
            }
            other => bail!("unknown {ENV_BACKEND}: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn no_backend_means_no_store() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])).expect("lookup"), None);
    }

    #[test]
    fn http_backend_needs_url_and_store_id() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            (ENV_BACKEND, "HTTP"),
            (ENV_URL, "https://script.example/exec"),
            (ENV_STORE_ID, "sheet-1"),
        ]))
        .expect("lookup");
        assert_eq!(
            cfg,
            Some(StoreConfig::Http {
                url: "https://script.example/exec".into(),
                store_id: "sheet-1".into(),
                relay_url: None,
            })
        );

        let missing = StoreConfig::from_lookup(lookup(&[(ENV_BACKEND, "http")]));
        assert!(missing.is_err());
        assert!(StoreConfig::from_lookup(lookup(&[(ENV_BACKEND, "ftp")])).is_err());
    }

    #[test]
    fn connect_params_decode() {
        let cfg: StoreConfig = serde_json::from_value(json!({
            "backend": "http",
            "url": "https://script.example/exec",
            "storeId": "sheet-1",
            "relayUrl": "https://relay.example/proxy"
        }))
        .expect("decode");
        assert_eq!(cfg.backend_name(), "relay");

        let cfg: StoreConfig =
            serde_json::from_value(json!({ "backend": "local", "path": "/tmp/x" })).expect("decode");
        assert_eq!(cfg.backend_name(), "local");
    }
}
