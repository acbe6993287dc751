use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use volunsched::config::SchedulingConfig;
use volunsched::roster::{RosterImportError, RosterImporter};
use volunsched::scheduling::{
    DispatchError, InMemoryScheduleStore, Notification, NotificationDispatcher, SchedulingService,
};

pub(crate) type ApiService = SchedulingService<InMemoryScheduleStore, LogNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Dispatcher that writes each outbound message to the log instead of a gateway.
#[derive(Debug, Default, Clone)]
pub(crate) struct LogNotifier;

impl NotificationDispatcher for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<(), DispatchError> {
        info!(
            volunteer_id = %notification.volunteer_id,
            phone = %notification.phone,
            event = ?notification.event,
            message = %notification.message,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Builds an in-memory service, seeding it from roster CSVs when paths are given.
pub(crate) fn build_service(
    config: SchedulingConfig,
    volunteers: Option<&Path>,
    shifts: Option<&Path>,
) -> Result<ApiService, RosterImportError> {
    let store = Arc::new(InMemoryScheduleStore::new());
    seed_roster(&store, volunteers, shifts)?;
    Ok(SchedulingService::new(store, Arc::new(LogNotifier), config))
}

pub(crate) fn seed_roster(
    store: &InMemoryScheduleStore,
    volunteers: Option<&Path>,
    shifts: Option<&Path>,
) -> Result<(), RosterImportError> {
    let importer = RosterImporter::new(store);
    if let Some(path) = volunteers {
        importer.volunteers_from_path(path)?;
        info!(path = %path.display(), "volunteer roster loaded");
    }
    if let Some(path) = shifts {
        importer.shifts_from_path(path)?;
        info!(path = %path.display(), "shift calendar loaded");
    }
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
