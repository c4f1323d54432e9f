use std::fmt;

use http::Method;

/// Route registration error
///
/// Returned by [`Router::register`](crate::router::Router::register) and the
/// per-method shorthands. Matching and reversal never produce this error: a
/// miss there is reported as `None` or an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Only GET, POST, PUT, PATCH, DELETE and OPTIONS can carry routes.
    UnsupportedMethod {
        /// The rejected method
        method: Method,
    },
    /// The path pattern could not be parsed.
    InvalidPattern {
        /// The pattern as given to `register`
        pattern: String,
        /// What is wrong with it
        reason: &'static str,
    },
    /// Another route already owns this name and the router is configured
    /// with [`DuplicateNamePolicy::Reject`](crate::config::DuplicateNamePolicy::Reject).
    DuplicateRouteName {
        /// The contested route name
        name: String,
        /// Pattern of the route currently holding the name
        existing_pattern: String,
    },
}

impl RouterError {
    /// Static code for log fields and metrics labels.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::UnsupportedMethod { .. } => "unsupported_method",
            RouterError::InvalidPattern { .. } => "invalid_pattern",
            RouterError::DuplicateRouteName { .. } => "duplicate_route_name",
        }
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::UnsupportedMethod { method } => {
                write!(
                    f,
                    "route registration error: method {method} is not routable \
                    (expected GET, POST, PUT, PATCH, DELETE or OPTIONS)"
                )
            }
            RouterError::InvalidPattern { pattern, reason } => {
                write!(
                    f,
                    "route registration error: invalid path pattern '{pattern}': {reason}"
                )
            }
            RouterError::DuplicateRouteName {
                name,
                existing_pattern,
            } => {
                write!(
                    f,
                    "route registration error: name '{name}' is already used by '{existing_pattern}'"
                )
            }
        }
    }
}

impl std::error::Error for RouterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_name_and_pattern() {
        let err = RouterError::DuplicateRouteName {
            name: "hello".to_string(),
            existing_pattern: "/hello/:name".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'hello'"));
        assert!(msg.contains("/hello/:name"));
        assert_eq!(err.code(), "duplicate_route_name");
    }

    #[test]
    fn test_display_unsupported_method() {
        let err = RouterError::UnsupportedMethod {
            method: Method::HEAD,
        };
        assert!(err.to_string().contains("HEAD"));
        assert_eq!(err.code(), "unsupported_method");
    }
}
