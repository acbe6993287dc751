use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    NewShift, NewVolunteer, ShiftId, SignupId, SignupStatus, VolunteerId, VolunteerUpdate,
};
use super::notifications::NotificationDispatcher;
use super::repository::{ScheduleStore, ShiftFilter, SignupFilter};
use super::service::{SchedulingError, SchedulingService};

type SharedService<S, N> = State<Arc<SchedulingService<S, N>>>;

/// Router exposing signup, roster, and coordinator endpoints.
pub fn scheduling_router<S, N>(service: Arc<SchedulingService<S, N>>) -> Router
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/signups",
            get(list_signups_handler::<S, N>).post(create_signup_handler::<S, N>),
        )
        .route("/api/v1/signups/validate", post(validate_handler::<S, N>))
        .route(
            "/api/v1/signups/:signup_id",
            get(signup_handler::<S, N>).delete(cancel_handler::<S, N>),
        )
        .route(
            "/api/v1/signups/:signup_id/status",
            put(update_status_handler::<S, N>),
        )
        .route(
            "/api/v1/volunteers",
            get(list_volunteers_handler::<S, N>).post(create_volunteer_handler::<S, N>),
        )
        .route(
            "/api/v1/volunteers/:volunteer_id",
            get(volunteer_handler::<S, N>)
                .put(update_volunteer_handler::<S, N>)
                .delete(delete_volunteer_handler::<S, N>),
        )
        .route(
            "/api/v1/volunteers/:volunteer_id/stats",
            get(stats_handler::<S, N>),
        )
        .route(
            "/api/v1/shifts",
            get(list_shifts_handler::<S, N>).post(create_shift_handler::<S, N>),
        )
        .route(
            "/api/v1/shifts/:shift_id",
            get(shift_handler::<S, N>)
                .put(update_shift_handler::<S, N>)
                .delete(delete_shift_handler::<S, N>),
        )
        .route(
            "/api/v1/shifts/:shift_id/eligible",
            get(eligible_handler::<S, N>),
        )
        .route(
            "/api/v1/coordinator/substitutes",
            get(substitutes_handler::<S, N>),
        )
        .route(
            "/api/v1/coordinator/dashboard",
            get(dashboard_handler::<S, N>),
        )
        .route(
            "/api/v1/coordinator/shifts/fill-status",
            get(fill_status_handler::<S, N>),
        )
        .route(
            "/api/v1/coordinator/volunteers/reliability",
            get(reliability_handler::<S, N>),
        )
        .route(
            "/api/v1/coordinator/notifications",
            post(broadcast_handler::<S, N>),
        )
        .route(
            "/api/v1/coordinator/reminders",
            post(reminders_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupRequest {
    volunteer_id: VolunteerId,
    shift_id: ShiftId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    status: SignupStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CapacityRequest {
    capacity: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExcludeQuery {
    #[serde(default)]
    exclude: Option<VolunteerId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubstituteQuery {
    shift_id: ShiftId,
    #[serde(default)]
    exclude: Option<VolunteerId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReliabilityQuery {
    #[serde(default)]
    min_score: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BroadcastRequest {
    volunteer_ids: Vec<VolunteerId>,
    message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReminderRequest {
    date: NaiveDate,
}

pub(crate) async fn list_signups_handler<S, N>(
    State(service): SharedService<S, N>,
    Query(filter): Query<SignupFilter>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.signups(&filter), StatusCode::OK)
}

pub(crate) async fn create_signup_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(request): Json<SignupRequest>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let SignupRequest {
        volunteer_id,
        shift_id,
    } = request;
    let result = with_lock_scope(service, move |service| service.signup(volunteer_id, shift_id));
    respond(result.await, StatusCode::CREATED)
}

pub(crate) async fn validate_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(request): Json<SignupRequest>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.validation_report(request.volunteer_id, request.shift_id),
        StatusCode::OK,
    )
}

pub(crate) async fn signup_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(signup_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.signup_record(SignupId(signup_id)), StatusCode::OK)
}

pub(crate) async fn cancel_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(signup_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let result = with_lock_scope(service, move |service| service.cancel(SignupId(signup_id)));
    respond(result.await, StatusCode::OK)
}

pub(crate) async fn update_status_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(signup_id): Path<u64>,
    Json(request): Json<StatusRequest>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let status = request.status;
    let result = with_lock_scope(service, move |service| {
        service.update_status(SignupId(signup_id), status)
    });
    respond(result.await, StatusCode::OK)
}

pub(crate) async fn list_volunteers_handler<S, N>(
    State(service): SharedService<S, N>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.volunteers(), StatusCode::OK)
}

pub(crate) async fn create_volunteer_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(volunteer): Json<NewVolunteer>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.register_volunteer(volunteer), StatusCode::CREATED)
}

pub(crate) async fn volunteer_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(volunteer_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.volunteer(VolunteerId(volunteer_id)), StatusCode::OK)
}

pub(crate) async fn update_volunteer_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(volunteer_id): Path<u64>,
    Json(update): Json<VolunteerUpdate>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.update_volunteer(VolunteerId(volunteer_id), update),
        StatusCode::OK,
    )
}

pub(crate) async fn stats_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(volunteer_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.stats(VolunteerId(volunteer_id)), StatusCode::OK)
}

pub(crate) async fn list_shifts_handler<S, N>(
    State(service): SharedService<S, N>,
    Query(filter): Query<ShiftFilter>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.shifts(&filter), StatusCode::OK)
}

pub(crate) async fn create_shift_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(shift): Json<NewShift>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.create_shift(shift), StatusCode::CREATED)
}

pub(crate) async fn shift_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(shift_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.shift(ShiftId(shift_id)), StatusCode::OK)
}

pub(crate) async fn update_shift_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(shift_id): Path<u64>,
    Json(request): Json<CapacityRequest>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.update_shift_capacity(ShiftId(shift_id), request.capacity),
        StatusCode::OK,
    )
}

pub(crate) async fn delete_volunteer_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(volunteer_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.delete_volunteer(VolunteerId(volunteer_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn delete_shift_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(shift_id): Path<u64>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.delete_shift(ShiftId(shift_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn eligible_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(shift_id): Path<u64>,
    Query(query): Query<ExcludeQuery>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.eligible(ShiftId(shift_id), query.exclude),
        StatusCode::OK,
    )
}

pub(crate) async fn substitutes_handler<S, N>(
    State(service): SharedService<S, N>,
    Query(query): Query<SubstituteQuery>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.substitutes(query.shift_id, query.exclude),
        StatusCode::OK,
    )
}

pub(crate) async fn dashboard_handler<S, N>(State(service): SharedService<S, N>) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.dashboard(), StatusCode::OK)
}

pub(crate) async fn fill_status_handler<S, N>(State(service): SharedService<S, N>) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(service.fill_status(), StatusCode::OK)
}

pub(crate) async fn reliability_handler<S, N>(
    State(service): SharedService<S, N>,
    Query(query): Query<ReliabilityQuery>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.volunteers_by_reliability(query.min_score),
        StatusCode::OK,
    )
}

pub(crate) async fn broadcast_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(request): Json<BroadcastRequest>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    respond(
        service.broadcast(&request.volunteer_ids, &request.message),
        StatusCode::OK,
    )
}

pub(crate) async fn reminders_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(request): Json<ReminderRequest>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.send_reminders(request.date) {
        Ok(delivered) => (
            StatusCode::OK,
            Json(json!({ "date": request.date, "delivered": delivered })),
        )
            .into_response(),
        Err(error) => failure(error),
    }
}

/// Runs a service call that may wait on the lock scope on the blocking pool, so a
/// contended shift never parks a runtime worker.
async fn with_lock_scope<S, N, T, F>(
    service: Arc<SchedulingService<S, N>>,
    call: F,
) -> Result<T, SchedulingError>
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
    T: Send + 'static,
    F: FnOnce(&SchedulingService<S, N>) -> Result<T, SchedulingError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| SchedulingError::TaskAborted(err.to_string()))?
}

fn respond<T: serde::Serialize>(
    result: Result<T, SchedulingError>,
    success: StatusCode,
) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(error) => failure(error),
    }
}

/// HTTP status for a scheduling failure. Shared with `AppError`.
pub(crate) fn status_for(error: &SchedulingError) -> StatusCode {
    match error {
        SchedulingError::Denied(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulingError::VolunteerNotFound(_)
        | SchedulingError::ShiftNotFound(_)
        | SchedulingError::SignupNotFound(_)
        | SchedulingError::RecordNotFound => StatusCode::NOT_FOUND,
        SchedulingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SchedulingError::Conflict(_) => StatusCode::CONFLICT,
        SchedulingError::LockTimeout(_)
        | SchedulingError::TaskAborted(_)
        | SchedulingError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn failure(error: SchedulingError) -> Response {
    let status = status_for(&error);

    let payload = match &error {
        SchedulingError::Denied(reason) => json!({
            "error": reason.summary(),
            "reason": reason.as_str(),
        }),
        other => json!({ "error": other.to_string() }),
    };

    if status == StatusCode::SERVICE_UNAVAILABLE {
        tracing::warn!(error = %error, "scheduling request failed on infrastructure");
    }

    (status, Json(payload)).into_response()
}
