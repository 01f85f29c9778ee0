use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use super::availability::AvailabilityService;
use super::error::{BookingError, ErrorClass};
use super::repository::ScheduleStore;
use super::service::BookingService;
use super::views::{
    BookingRequest, DailyAvailabilityQuery, RescheduleRequest, WindowAvailabilityQuery,
};
use crate::clock::Clock;
use crate::config::SchedulingConfig;
use crate::scheduling::BookingId;

/// Both services over one store and clock; the state behind [`booking_router`].
pub struct BookingApi<S, C> {
    pub bookings: BookingService<S, C>,
    pub availability: AvailabilityService<S, C>,
}

impl<S, C> BookingApi<S, C>
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, config: SchedulingConfig) -> Self {
        Self {
            bookings: BookingService::new(Arc::clone(&store), Arc::clone(&clock), config),
            availability: AvailabilityService::new(store, clock, config),
        }
    }
}

/// Router builder exposing availability queries and booking mutations.
pub fn booking_router<S, C>(api: Arc<BookingApi<S, C>>) -> Router
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/availability/date", get(daily_handler::<S, C>))
        .route("/availability/cleaners", get(window_handler::<S, C>))
        .route("/bookings", post(create_handler::<S, C>))
        .route(
            "/bookings/:booking_id",
            get(get_handler::<S, C>).delete(cancel_handler::<S, C>),
        )
        .route(
            "/bookings/:booking_id/reschedule",
            put(reschedule_handler::<S, C>),
        )
        .with_state(api)
}

pub(crate) async fn daily_handler<S, C>(
    State(api): State<Arc<BookingApi<S, C>>>,
    query: Result<Query<DailyAvailabilityQuery>, QueryRejection>,
) -> Response
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match api.availability.daily(query.date) {
        Ok(vehicles) => (StatusCode::OK, Json(vehicles)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn window_handler<S, C>(
    State(api): State<Arc<BookingApi<S, C>>>,
    query: Result<Query<WindowAvailabilityQuery>, QueryRejection>,
) -> Response
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match api
        .availability
        .window(query.date, query.start_time, query.duration_minutes)
    {
        Ok(vehicles) => (StatusCode::OK, Json(vehicles)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_handler<S, C>(
    State(api): State<Arc<BookingApi<S, C>>>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Response
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match api.bookings.create(request) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<S, C>(
    State(api): State<Arc<BookingApi<S, C>>>,
    booking_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    let Path(booking_id) = match booking_id {
        Ok(path) => path,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match api.bookings.get(BookingId(booking_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn cancel_handler<S, C>(
    State(api): State<Arc<BookingApi<S, C>>>,
    booking_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    let Path(booking_id) = match booking_id {
        Ok(path) => path,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match api.bookings.cancel(BookingId(booking_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn reschedule_handler<S, C>(
    State(api): State<Arc<BookingApi<S, C>>>,
    booking_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<RescheduleRequest>, JsonRejection>,
) -> Response
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    let Path(booking_id) = match booking_id {
        Ok(path) => path,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match api.bookings.reschedule(BookingId(booking_id), request) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

impl ErrorClass {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorClass::ClientInput => StatusCode::BAD_REQUEST,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        error_response(self.class().status(), self.to_string())
    }
}

fn bad_request(message: String) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// `{timestamp, status, error, message}` body shared by every failure.
pub fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "status": status.as_u16(),
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message,
    });
    (status, Json(payload)).into_response()
}
