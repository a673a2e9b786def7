#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use tower::ServiceExt;

use user_api::{
    models::user::{NewUser, UserField, UserModel},
    services::hooks::{ChannelObserver, UserChange},
    startup::{AppState, app},
    store::{UserStore, clause::Fragment},
    version::BuildInfo,
};

/// Keeps users in memory with the same semantics as the Postgres repository.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserModel>>,
    next_id: Mutex<i64>,
    failure: Mutex<Option<String>>,
    calls: Mutex<usize>,
}

fn field_value(user: &UserModel, field: UserField) -> &str {
    match field {
        UserField::FirstName => &user.first_name,
        UserField::LastName => &user.last_name,
        UserField::Nickname => &user.nickname,
        UserField::Password => &user.password,
        UserField::Email => &user.email,
        UserField::Country => &user.country,
    }
}

fn set_field(user: &mut UserModel, field: UserField, value: &str) {
    let slot = match field {
        UserField::FirstName => &mut user.first_name,
        UserField::LastName => &mut user.last_name,
        UserField::Nickname => &mut user.nickname,
        UserField::Password => &mut user.password,
        UserField::Email => &mut user.email,
        UserField::Country => &mut user.country,
    };
    *slot = value.to_string();
}

impl MemoryStore {
    /// Makes every following call fail with `message`, like a lost connection.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn users(&self) -> Vec<UserModel> {
        self.users.lock().unwrap().clone()
    }

    /// Number of storage calls made so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn parse_id(id: &str) -> anyhow::Result<i64> {
        id.parse::<i64>()
            .map_err(|_| anyhow::anyhow!("invalid input syntax for type bigint: \"{}\"", id))
    }

    fn enter(&self) -> anyhow::Result<()> {
        *self.calls.lock().unwrap() += 1;
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<()> {
        self.enter()?;
        if self.users.lock().unwrap().iter().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            *next_id
        };
        let now = Utc::now();
        self.users.lock().unwrap().push(UserModel {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            nickname: user.nickname.clone(),
            password: user.password.clone(),
            email: user.email.clone(),
            country: user.country.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn list_users(&self, filter: &[Fragment]) -> anyhow::Result<Vec<UserModel>> {
        self.enter()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|user| filter.iter().all(|f| field_value(user, f.field) == f.value))
            .cloned()
            .collect())
    }

    async fn update_user(&self, id: &str, assignments: &[Fragment]) -> anyhow::Result<u64> {
        self.enter()?;
        let id = Self::parse_id(id)?;
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                for assignment in assignments {
                    set_field(user, assignment.field, &assignment.value);
                }
                user.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_user(&self, id: &str) -> anyhow::Result<u64> {
        self.enter()?;
        let id = Self::parse_id(id)?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok((before - users.len()) as u64)
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub changes: broadcast::Receiver<UserChange>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let store = Arc::new(MemoryStore::default());
        let observer = ChannelObserver::new(64);
        let changes = observer.subscribe();
        let state = AppState::new(
            store.clone(),
            Arc::new(observer),
            BuildInfo::from_build_env(),
        );
        Self {
            router: app(state, Duration::from_secs(15)),
            store,
            changes,
        }
    }

    /// Sends a request with an optional form-encoded body and returns the
    /// status and decoded JSON body.
    pub async fn send(&self, method: Method, uri: &str, form: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn create(&self, form: &str) -> (StatusCode, Value) {
        self.send(Method::POST, "/user", Some(form)).await
    }

    pub async fn list(&self, query: &str) -> Vec<Value> {
        let uri = if query.is_empty() {
            "/users".to_string()
        } else {
            format!("/users?{query}")
        };
        let (status, body) = self.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK, "list failed: {body}");
        body.as_array().cloned().expect("list returns an array")
    }

    /// Drains pending change notifications.
    pub fn take_changes(&mut self) -> Vec<UserChange> {
        let mut changes = Vec::new();
        while let Ok(change) = self.changes.try_recv() {
            changes.push(change);
        }
        changes
    }
}
