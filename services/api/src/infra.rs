use card_intake::config::StoreConfig;
use card_intake::store::{HostedStore, MemoryIdentity, MemoryStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Where application and account data lives for this process.
pub(crate) enum Backend {
    Hosted(Arc<HostedStore>),
    Memory {
        store: Arc<MemoryStore>,
        identity: Arc<MemoryIdentity>,
    },
}

impl Backend {
    pub(crate) fn from_config(config: &StoreConfig) -> Self {
        match config.url.as_deref() {
            Some(url) => Backend::Hosted(Arc::new(HostedStore::new(
                url,
                config.service_key.as_str(),
            ))),
            None => {
                tracing::warn!("STORE_URL is not set; data is kept in memory and lost on exit");
                Backend::Memory {
                    store: Arc::new(MemoryStore::new()),
                    identity: Arc::new(MemoryIdentity::new()),
                }
            }
        }
    }

    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Backend::Hosted(_) => "hosted",
            Backend::Memory { .. } => "memory",
        }
    }
}
