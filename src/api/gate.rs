//! Route gate for page requests.
//!
//! Runs before any page is served. It looks only at whether a session cookie
//! is present, never at whether it is valid; the task endpoints verify the
//! session themselves.
//!
//! | Path                          | Cookie | Result                  |
//! |-------------------------------|--------|-------------------------|
//! | `/dashboard`, `/dashboard/..` | no     | redirect to `/login`    |
//! | `/login`                      | yes    | redirect to `/dashboard`|
//! | anything else                 | any    | pass through            |

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::auth::has_session_cookie;

/// Root of the protected area.
pub const PROTECTED_PREFIX: &str = "/dashboard";

/// Login page.
pub const LOGIN_PATH: &str = "/login";

/// Outcome of evaluating a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Serve the request as usual.
    PassThrough,
    /// Redirect to the given path.
    Redirect(&'static str),
}

fn is_protected(path: &str) -> bool {
    path.strip_prefix(PROTECTED_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_login(path: &str) -> bool {
    path.strip_prefix(LOGIN_PATH)
        .is_some_and(|rest| rest.is_empty() || rest == "/")
}

/// Decides what to do with a page request.
#[must_use]
pub fn evaluate(path: &str, has_cookie: bool) -> GateDecision {
    if is_protected(path) && !has_cookie {
        GateDecision::Redirect(LOGIN_PATH)
    } else if is_login(path) && has_cookie {
        GateDecision::Redirect(PROTECTED_PREFIX)
    } else {
        GateDecision::PassThrough
    }
}

/// Middleware applying [`evaluate`] to every request.
pub async fn route_gate(request: Request, next: Next) -> Response {
    let decision = evaluate(request.uri().path(), has_session_cookie(request.headers()));

    match decision {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(path = %request.uri().path(), location = target, "Route gate redirect");
            Redirect::temporary(target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/dashboard", false, GateDecision::Redirect("/login"))]
    #[case("/dashboard/settings", false, GateDecision::Redirect("/login"))]
    #[case("/dashboard", true, GateDecision::PassThrough)]
    #[case("/dashboard/settings", true, GateDecision::PassThrough)]
    #[case("/login", true, GateDecision::Redirect("/dashboard"))]
    #[case("/login/", true, GateDecision::Redirect("/dashboard"))]
    #[case("/login", false, GateDecision::PassThrough)]
    #[case("/", false, GateDecision::PassThrough)]
    #[case("/", true, GateDecision::PassThrough)]
    #[case("/dashboards", false, GateDecision::PassThrough)]
    #[case("/login/help", true, GateDecision::PassThrough)]
    #[case("/tasks", false, GateDecision::PassThrough)]
    fn test_evaluate(#[case] path: &str, #[case] has_cookie: bool, #[case] expected: GateDecision) {
        assert_eq!(evaluate(path, has_cookie), expected);
    }
}
