use axum::{
    Form, Json,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use crate::{
    errors::ApiError,
    models::user::{NewUser, UserField, UserModel},
    startup::AppState,
    store::clause::collect_fragments,
};

/// Decoded form or query pairs, in the order they were sent.
type Pairs = Vec<(String, String)>;

/// First value sent for `key`, the way repeated form keys have always been read.
fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// A request without a form body carries no fields; validation decides what
/// that means for the operation.
fn form_pairs(form: Result<Form<Pairs>, FormRejection>) -> Result<Pairs, ApiError> {
    match form {
        Ok(Form(pairs)) => Ok(pairs),
        Err(FormRejection::InvalidFormContentType(_)) => Ok(Vec::new()),
        Err(e) => Err(ApiError::InvalidForm(e.body_text())),
    }
}

fn ok_body() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// POST /user with a form-encoded body. `email` is required.
#[instrument(name = "HTTP: Create user", skip(state, form))]
pub async fn create_user(
    State(state): State<AppState>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = form_pairs(form)?;
    let user = NewUser::from_lookup(|key| first_value(&pairs, key));

    state.user_service.create(user).await?;
    tracing::info!("User created");
    Ok((StatusCode::CREATED, ok_body()))
}

/// GET /users, e.g. `/users?country=USA&first_name=Hulk`. Every supplied
/// field must match.
#[instrument(name = "HTTP: List users", skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Json<Vec<UserModel>>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::InvalidForm(e.body_text()))?;
    let filter = collect_fragments(&UserField::ALL, |key| first_value(&pairs, key));

    let users = state.user_service.list(filter).await?;
    Ok(Json(users))
}

/// PATCH /user/{id} with the fields to change as a form-encoded body.
#[instrument(name = "HTTP: Update user", skip(state, form))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = form_pairs(form)?;
    let assignments = collect_fragments(&UserField::ALL, |key| first_value(&pairs, key));

    state.user_service.update(&id, assignments).await?;
    Ok(ok_body())
}

/// DELETE /user/{id}
#[instrument(name = "HTTP: Delete user", skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_service.delete(&id).await?;
    Ok(ok_body())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_wins_for_repeated_keys() {
        let pairs = vec![
            ("country".to_string(), "UK".to_string()),
            ("country".to_string(), "USA".to_string()),
        ];
        assert_eq!(first_value(&pairs, "country"), Some("UK"));
        assert_eq!(first_value(&pairs, "email"), None);
    }
}
