use std::sync::Arc;

use axum::http::Method;

use super::ADMIN_ROLE;

/// RouteDescriptor
///
/// One `(method, path)` pair that only admins may call. `path` is compared verbatim
/// with the full request path, so `/api/private/users/` and `/api/private/users`
/// are different entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub method: Method,
    pub path: String,
}

impl RouteDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// The user collection endpoints: listing, creating and batch deleting users.
    pub fn default_admin_routes() -> Vec<Self> {
        vec![
            Self::new(Method::GET, "/api/private/users/"),
            Self::new(Method::POST, "/api/private/users/"),
            Self::new(Method::DELETE, "/api/private/users/"),
        ]
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.path == path
    }
}

/// RoutePermissions
///
/// Immutable table of elevated routes, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct RoutePermissions {
    elevated: Arc<[RouteDescriptor]>,
}

impl RoutePermissions {
    pub fn new(elevated: Vec<RouteDescriptor>) -> Self {
        for route in &elevated {
            if route.path.contains('{') || route.path.contains(':') {
                tracing::warn!(
                    method = %route.method,
                    path = %route.path,
                    "elevated route contains a path parameter; it only matches the literal path"
                );
            }
        }
        Self {
            elevated: elevated.into(),
        }
    }

    pub fn elevated_routes(&self) -> &[RouteDescriptor] {
        &self.elevated
    }

    /// evaluate
    ///
    /// Returns whether `role` may call `method path`. Routes in the elevated table need
    /// the admin role; every other route is open to any authenticated caller.
    pub fn evaluate(&self, method: &Method, path: &str, role: &str) -> bool {
        match self.elevated.iter().find(|route| route.matches(method, path)) {
            Some(_) => role == ADMIN_ROLE,
            None => true,
        }
    }
}

impl Default for RoutePermissions {
    fn default() -> Self {
        Self::new(RouteDescriptor::default_admin_routes())
    }
}
