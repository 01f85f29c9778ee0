use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use crew_booking::booking::{BookingError, InMemoryScheduleStore};
use crew_booking::config::SchedulingConfig;
use crew_booking::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) const FLEET_VEHICLES: usize = 5;
pub(crate) const CLEANERS_PER_VEHICLE: usize = 5;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Registers the standard fleet unless vehicles are already present.
pub(crate) fn seed_fleet(store: &InMemoryScheduleStore) -> Result<(), AppError> {
    let seeded = store
        .seed_fleet(FLEET_VEHICLES, CLEANERS_PER_VEHICLE)
        .map_err(BookingError::from)?;
    if seeded {
        info!(
            vehicles = FLEET_VEHICLES,
            cleaners_per_vehicle = CLEANERS_PER_VEHICLE,
            "seeded fleet"
        );
    }
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    crew_booking::booking::views::parse_date(raw)
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    crew_booking::booking::views::parse_time(raw)
}

/// Local wall-clock instant, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD HH:MM`.
pub(crate) fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM"))
}

/// Interprets a local wall-clock instant in the configured timezone.
pub(crate) fn local_to_utc(local: NaiveDateTime, config: &SchedulingConfig) -> DateTime<Utc> {
    // a fixed offset maps every local time to exactly one instant
    config
        .timezone
        .from_local_datetime(&local)
        .single()
        .map(|instant| instant.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}
