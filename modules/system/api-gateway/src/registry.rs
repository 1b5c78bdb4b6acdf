//! Route requirement registry, matched per HTTP method.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::requirement::EndpointRequirement;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to insert route pattern '{path}': {source}")]
    Insert {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("route '{path}' requires access on path parameter '{param}' it does not declare")]
    UnknownParam { path: String, param: String },
}

/// Path parameters captured by a route match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A matched route.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub requirement: Arc<EndpointRequirement>,
    pub params: RouteParams,
}

/// Route matcher for a specific HTTP method.
#[derive(Clone)]
struct RouteMatcher {
    matcher: matchit::Router<Arc<EndpointRequirement>>,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self {
            matcher: matchit::Router::new(),
        }
    }
}

/// Requirements for every gated route. Built at startup, read-only afterwards.
#[derive(Clone, Default)]
pub struct RouteRegistry {
    matchers: HashMap<Method, RouteMatcher>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route pattern using `{param}` syntax.
    ///
    /// # Errors
    /// Returns [`RegistryError`] if the pattern conflicts with one already
    /// registered for the method, or if the role requirement reads a path
    /// parameter the pattern does not declare.
    pub fn insert(
        &mut self,
        method: Method,
        path: &str,
        requirement: EndpointRequirement,
    ) -> Result<(), RegistryError> {
        if let Some(param) = requirement.role.as_ref().and_then(|r| r.resource.param())
            && !path.contains(&format!("{{{param}}}"))
        {
            return Err(RegistryError::UnknownParam {
                path: path.to_owned(),
                param: param.to_owned(),
            });
        }

        self.matchers
            .entry(method)
            .or_default()
            .matcher
            .insert(path, Arc::new(requirement))
            .map_err(|source| RegistryError::Insert {
                path: path.to_owned(),
                source,
            })
    }

    /// `HEAD` falls back to the `GET` registration, the way axum routes it.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute> {
        self.lookup(method, path).or_else(|| {
            (method == Method::HEAD)
                .then(|| self.lookup(&Method::GET, path))
                .flatten()
        })
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<ResolvedRoute> {
        let matched = self.matchers.get(method)?.matcher.at(path).ok()?;
        Some(ResolvedRoute {
            requirement: Arc::clone(matched.value),
            params: RouteParams::from_pairs(
                matched
                    .params
                    .iter()
                    .map(|(name, value)| (name, decode_segment(value))),
            ),
        })
    }
}

/// Percent-decode a captured segment so `acme%2Fapp` addresses `acme/app`.
/// Segments that do not decode to UTF-8 are kept as received.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), Cow::into_owned)
}
