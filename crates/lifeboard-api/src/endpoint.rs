use std::fmt;
use std::sync::Arc;

use reqwest::Method;

type PathFn<V> = Arc<dyn Fn(&V) -> String + Send + Sync>;

/// Where an endpoint's path comes from.
pub enum EndpointPath<V> {
    /// Same path for every call, e.g. `"habits"`.
    Static(String),
    /// Built from the call's variables, e.g. `|h: &Habit| format!("habits/{}", h.id)`.
    Dynamic(PathFn<V>),
}

impl<V> Clone for EndpointPath<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(path) => Self::Static(path.clone()),
            Self::Dynamic(f) => Self::Dynamic(Arc::clone(f)),
        }
    }
}

/// Immutable description of one backend operation: path, verb, and
/// whether a 401 on it should go through the refresh flow.
///
/// Defaults to `POST` with `auth = true`, the common shape for mutations.
pub struct Endpoint<V = ()> {
    path: EndpointPath<V>,
    method: Method,
    auth: bool,
}

impl<V> Endpoint<V> {
    /// An endpoint with a fixed path.
    pub fn fixed(path: impl Into<String>) -> Self {
        Self {
            path: EndpointPath::Static(path.into()),
            method: Method::POST,
            auth: true,
        }
    }

    /// An endpoint whose path depends on the call's variables.
    pub fn dynamic<F>(path: F) -> Self
    where
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        Self {
            path: EndpointPath::Dynamic(Arc::new(path)),
            method: Method::POST,
            auth: true,
        }
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Whether a 401 triggers the refresh-and-retry flow (default `true`).
    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    pub fn http_method(&self) -> &Method {
        &self.method
    }

    pub fn requires_auth(&self) -> bool {
        self.auth
    }

    /// Resolve the path for one call.
    pub fn resolve(&self, variables: &V) -> String {
        match &self.path {
            EndpointPath::Static(path) => path.clone(),
            EndpointPath::Dynamic(f) => f(variables),
        }
    }
}

impl<V> Clone for Endpoint<V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            method: self.method.clone(),
            auth: self.auth,
        }
    }
}

impl<V> fmt::Debug for Endpoint<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match &self.path {
            EndpointPath::Static(path) => path.as_str(),
            EndpointPath::Dynamic(_) => "<dynamic>",
        };
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &path)
            .field("auth", &self.auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_path_uses_variables() {
        let endpoint = Endpoint::dynamic(|id: &u32| format!("expenses/{id}")).method(Method::DELETE);
        assert_eq!(endpoint.resolve(&42), "expenses/42");
        assert_eq!(endpoint.http_method(), &Method::DELETE);
        assert!(endpoint.requires_auth());
    }

    #[test]
    fn fixed_path_defaults_to_post() {
        let endpoint: Endpoint = Endpoint::fixed("habits").auth(false);
        assert_eq!(endpoint.resolve(&()), "habits");
        assert_eq!(endpoint.http_method(), &Method::POST);
        assert!(!endpoint.requires_auth());
    }
}
