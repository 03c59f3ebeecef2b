use metrics_exporter_prometheus::PrometheusHandle;
use opportunity_insights::config::AppConfig;
use opportunity_insights::leads::{AdminToken, JsonFileStore, LeadService};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) catalog_dir: Arc<PathBuf>,
}

/// The file-backed lead service described by the loaded configuration.
pub(crate) fn lead_service(config: &AppConfig) -> Arc<LeadService<JsonFileStore>> {
    let store = Arc::new(JsonFileStore::new(config.leads.file.clone()));
    Arc::new(LeadService::new(
        store,
        AdminToken::new(config.leads.admin_token.clone()),
    ))
}
