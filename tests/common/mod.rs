#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use chrono::Utc;
use conference_registration::{
    AppState, IdentityClaims,
    config::AppConfig,
    create_router,
    models::{Notification, NotificationInput, User, UserChanges},
    pagination::PageRequest,
    password,
    repository::{Repository, RepositoryState},
};
use serde_json::Value;
use tower::ServiceExt;

// --- In-Memory Repository ---

/// Keeps users and notifications in vectors so the whole router can run without Postgres.
/// Sorting is ignored; rows come back in insertion order.
#[derive(Default)]
pub struct MemoryRepo {
    pub users: Mutex<Vec<User>>,
    pub notifications: Mutex<Vec<Notification>>,
}

impl MemoryRepo {
    /// Seeds a user with an argon2 hash of `plain`.
    pub fn with_user(self, username: &str, plain: &str, authority: &str) -> Self {
        {
            let mut users = self.users.lock().unwrap();
            let id = users.len() as i64 + 1;
            users.push(User {
                id,
                username: username.to_string(),
                email: format!("{username}@example.org"),
                password: password::hash_password(plain).unwrap(),
                authority: authority.to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                ..User::default()
            });
        }
        self
    }

    pub fn with_notification(self, title: &str) -> Self {
        {
            let mut notifications = self.notifications.lock().unwrap();
            let id = notifications.len() as i64 + 1;
            notifications.push(Notification {
                id,
                title: title.to_string(),
                content: format!("{title} content"),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
        self
    }
}

fn page_of<T: Clone>(rows: &[T], page: &PageRequest) -> Vec<T> {
    rows.iter()
        .skip(page.offset() as usize)
        .take(page.page_size as usize)
        .cloned()
        .collect()
}

fn apply_changes(user: &mut User, changes: UserChanges) {
    if let Some(v) = changes.username {
        user.username = v;
    }
    if let Some(v) = changes.name {
        user.name = v;
    }
    if let Some(v) = changes.password_hash {
        user.password = v;
    }
    if let Some(v) = changes.email {
        user.email = v;
    }
    if let Some(v) = changes.institute {
        user.institute = v;
    }
    if let Some(v) = changes.status {
        user.status = v;
    }
    if let Some(v) = changes.authority {
        user.authority = v;
    }
    user.updated_at = Utc::now();
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn count_users(&self) -> Result<i64, sqlx::Error> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn list_users(&self, page: &PageRequest) -> Result<Vec<User>, sqlx::Error> {
        Ok(page_of(&self.users.lock().unwrap(), page))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }

    async fn create_user(&self, changes: UserChanges) -> Result<User, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        let mut user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            authority: "user".to_string(),
            created_at: Utc::now(),
            ..User::default()
        };
        apply_changes(&mut user, changes);
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            apply_changes(user, changes);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|index| users.remove(index)))
    }

    async fn delete_users(&self, ids: &[i64]) -> Result<u64, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| !ids.contains(&u.id));
        Ok((before - users.len()) as u64)
    }

    async fn count_notifications(&self) -> Result<i64, sqlx::Error> {
        Ok(self.notifications.lock().unwrap().len() as i64)
    }

    async fn list_notifications(
        &self,
        page: &PageRequest,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        Ok(page_of(&self.notifications.lock().unwrap(), page))
    }

    async fn get_notification(&self, id: i64) -> Result<Option<Notification>, sqlx::Error> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id)
            .cloned())
    }

    async fn create_notification(
        &self,
        input: NotificationInput,
    ) -> Result<Notification, sqlx::Error> {
        let mut notifications = self.notifications.lock().unwrap();
        let notification = Notification {
            id: notifications.iter().map(|n| n.id).max().unwrap_or(0) + 1,
            title: input.title.unwrap_or_default(),
            content: input.content.unwrap_or_default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        notifications.push(notification.clone());
        Ok(notification)
    }

    async fn update_notification(
        &self,
        id: i64,
        input: NotificationInput,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let mut notifications = self.notifications.lock().unwrap();
        Ok(notifications.iter_mut().find(|n| n.id == id).map(|n| {
            if let Some(title) = input.title {
                n.title = title;
            }
            if let Some(content) = input.content {
                n.content = content;
            }
            n.clone()
        }))
    }

    async fn delete_notification(&self, id: i64) -> Result<Option<Notification>, sqlx::Error> {
        let mut notifications = self.notifications.lock().unwrap();
        Ok(notifications
            .iter()
            .position(|n| n.id == id)
            .map(|index| notifications.remove(index)))
    }

    async fn delete_notifications(&self, ids: &[i64]) -> Result<u64, sqlx::Error> {
        let mut notifications = self.notifications.lock().unwrap();
        let before = notifications.len();
        notifications.retain(|n| !ids.contains(&n.id));
        Ok((before - notifications.len()) as u64)
    }
}

// --- Harness ---

pub struct TestApp {
    pub state: AppState,
    pub repo: Arc<MemoryRepo>,
    pub router: Router,
}

impl TestApp {
    pub fn new(repo: MemoryRepo) -> Self {
        let repo = Arc::new(repo);
        let state = AppState::new(repo.clone() as RepositoryState, AppConfig::default());
        let router = create_router(state.clone());
        Self {
            state,
            repo,
            router,
        }
    }

    /// Signs a token with the app's own secret.
    pub fn token(&self, subject_id: i64, role: &str) -> String {
        self.state
            .tokens
            .issue(&IdentityClaims::new(subject_id, role))
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (Response, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (Response::from_parts(parts, Body::empty()), json)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
