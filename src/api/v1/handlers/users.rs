/*
 * Responsibility
 * - /users 系 CRUD handler
 * - 認可は Authorized<Op> extractor で済ませてから本体に入る (失敗時 handler は呼ばれない)
 * - DTO validation → repo 呼び出し → 呼び出し元の role で redact してから返す
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::users::{CreateUserRequest, UpdateUserRequest, UserResponse},
        extractors::authorized::{
            Authorized, CreateUser, DeleteUser, GetUser, ListUsers, UpdateUser,
        },
    },
    error::AppError,
    services::authz::{redact, redact_all},
    state::AppState,
};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| AppError::bad_request("INVALID_BODY", rejection.body_text()))
}

fn parse_user_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request("INVALID_PATH", rejection.body_text()))
}

pub async fn list_users(
    auth: Authorized<ListUsers>,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = state.users.list().await?;
    let res: Vec<UserResponse> = rows.into_iter().map(UserResponse::from).collect();

    Ok(Json(redact_all(res, auth.current_roles())))
}

pub async fn get_user(
    auth: Authorized<GetUser>,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = parse_user_id(path)?;
    let row = state
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(redact(UserResponse::from(row), auth.current_roles())))
}

pub async fn create_user(
    auth: Authorized<CreateUser>,
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let req = body(payload)?;
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let row = state.users.create(req.into_new_user()).await?;

    tracing::info!(
        user_id = %row.id,
        username = %row.username,
        created_by = %auth.current_username(),
        "user created"
    );

    Ok((
        StatusCode::CREATED,
        Json(redact(UserResponse::from(row), auth.current_roles())),
    ))
}

pub async fn update_user(
    auth: Authorized<UpdateUser>,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = parse_user_id(path)?;
    let req = body(payload)?;
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let row = state
        .users
        .update(user_id, req.into_changes())
        .await?
        .ok_or(AppError::not_found("user"))?;

    tracing::info!(
        user_id = %row.id,
        updated_by = %auth.current_username(),
        "user updated"
    );

    Ok(Json(redact(UserResponse::from(row), auth.current_roles())))
}

pub async fn delete_user(
    auth: Authorized<DeleteUser>,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let user_id = parse_user_id(path)?;
    if !state.users.delete(user_id).await? {
        return Err(AppError::not_found("user"));
    }

    tracing::info!(
        user_id = %user_id,
        deleted_by = %auth.current_username(),
        "user deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
