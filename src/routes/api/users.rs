use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::query::ListQuery;
use crate::{
    auth::{UserCreate, UserDelete, UserList, UserShow, UserUpdate},
    db::dao::PaginatedResponse,
    response::{ApiResult, JsonApiResponse},
    routes::Authorized,
    services::{
        ServiceContext,
        user_service::{NewUser, UserChanges, UserDetails, UserListItem, UserQuery},
    },
    state::AppState,
    validation::{
        MIN_PASSWORD_LEN, Validate, ValidatedJson, Validator, email, min_len, passwords_match,
        required,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default = "active")]
    pub status: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub role_id: Option<Uuid>,
}

fn active() -> bool {
    true
}

impl Validate for CreateUserRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("name", required("name", &self.name))
            .check("email", required("email", &self.email))
            .check("email", email("email", &self.email))
            .check("password", required("password", &self.password))
            .check("password", min_len("password", &self.password, MIN_PASSWORD_LEN))
            .check("confirmPassword", required("confirmPassword", &self.confirm_password))
            .check("confirmPassword", passwords_match(&self.password, &self.confirm_password));
    }
}

/// Absent fields are left as they are.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub status: Option<bool>,
    pub image: Option<String>,
    pub role_id: Option<Uuid>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self, v: &mut Validator) {
        if let Some(name) = &self.name {
            v.check("name", required("name", name));
        }
        if let Some(address) = &self.email {
            v.check("email", required("email", address))
                .check("email", email("email", address));
        }
        if let Some(password) = &self.password {
            let confirm = self.confirm_password.as_deref().unwrap_or_default();
            v.check("password", min_len("password", password, MIN_PASSWORD_LEN))
                .check("confirmPassword", passwords_match(password, confirm));
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedUser {
    pub id: Uuid,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/{id}",
            get(show_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    guard: Authorized<UserCreate>,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> ApiResult<UserDetails> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .create_local(
            NewUser {
                name: body.name,
                email: body.email,
                password: Some(body.password),
                image: body.image,
                status: body.status,
                role_id: body.role_id,
            },
            Some(guard.user_id),
        )
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "User created successfully", user)
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<UserList>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<UserListItem>> {
    let users = ServiceContext::from_state(state.as_ref())
        .user()
        .list(UserQuery {
            search: query.search,
            role_id: query.role_id,
            page: query.page,
            limit: query.limit,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Users retrieved successfully", users)
}

async fn show_user(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<UserShow>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserDetails> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .details(id)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "User retrieved successfully", user)
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    guard: Authorized<UserUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserDetails> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .update(
            id,
            UserChanges {
                name: body.name,
                email: body.email,
                password: body.password,
                image: body.image,
                status: body.status,
                role_id: body.role_id,
            },
            Some(guard.user_id),
        )
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "User updated successfully", user)
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    _guard: Authorized<UserDelete>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedUser> {
    ServiceContext::from_state(state.as_ref())
        .user()
        .remove(id)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "User deleted successfully", DeletedUser { id })
}

#[cfg(test)]
mod tests {
    use super::UpdateUserRequest;
    use crate::validation::run;

    #[test]
    fn empty_update_is_valid() {
        run(&UpdateUserRequest::default()).expect("nothing to check");
    }

    #[test]
    fn new_password_needs_confirmation() {
        let err = run(&UpdateUserRequest {
            password: Some("secret1".to_string()),
            ..Default::default()
        })
        .expect_err("confirmation missing");
        assert_eq!(
            err.field_errors().expect("field errors")["confirmPassword"],
            "Passwords do not match"
        );
    }
}
