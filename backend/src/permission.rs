//! Permission rules
//!
//! A rule is a small tree evaluated against the authenticated user:
//! `Any` holds when one child holds (or when it has no children), `All` holds
//! when every child holds, `User` matches one specific account and `Check`
//! runs an arbitrary predicate.

use std::fmt;
use std::sync::Arc;

use crate::error::{ApiError, AppResult};
use crate::middleware::AuthUser;

type Predicate = Arc<dyn Fn(&AuthUser) -> bool + Send + Sync>;

/// Permission rule tree
#[derive(Clone)]
pub enum Rule {
    Any(Vec<Rule>),
    All(Vec<Rule>),
    User(i64),
    Check(Predicate),
}

impl Rule {
    /// Any logged-in user
    pub fn authenticated() -> Self {
        Rule::Any(Vec::new())
    }

    /// Exactly the given user
    pub fn user(user_id: i64) -> Self {
        Rule::User(user_id)
    }

    /// Custom predicate
    pub fn check<F>(predicate: F) -> Self
    where
        F: Fn(&AuthUser) -> bool + Send + Sync + 'static,
    {
        Rule::Check(Arc::new(predicate))
    }

    pub fn evaluate(&self, user: &AuthUser) -> bool {
        match self {
            Rule::Any(rules) => rules.is_empty() || rules.iter().any(|r| r.evaluate(user)),
            Rule::All(rules) => rules.iter().all(|r| r.evaluate(user)),
            Rule::User(id) => user.user_id == *id,
            Rule::Check(predicate) => predicate(user),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Any(rules) => f.debug_tuple("Any").field(rules).finish(),
            Rule::All(rules) => f.debug_tuple("All").field(rules).finish(),
            Rule::User(id) => f.debug_tuple("User").field(id).finish(),
            Rule::Check(_) => f.write_str("Check(..)"),
        }
    }
}

/// Require a logged-in user satisfying `rule`
pub fn check<'a>(user: Option<&'a AuthUser>, rule: &Rule) -> AppResult<&'a AuthUser> {
    let user = user.ok_or(ApiError::LoginRequired)?;
    if rule.evaluate(user) {
        Ok(user)
    } else {
        tracing::debug!(user_id = user.user_id, ?rule, "Permission denied");
        Err(ApiError::PermissionDenied)
    }
}

/// Non-failing variant of [`check`]
pub fn is_permitted(user: Option<&AuthUser>, rule: &Rule) -> bool {
    user.map(|u| rule.evaluate(u)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(id: i64) -> AuthUser {
        AuthUser {
            user_id: id,
            session_id: Uuid::new_v4(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_authenticated_rule() {
        let alice = user(1);
        assert!(check(Some(&alice), &Rule::authenticated()).is_ok());
        assert!(matches!(
            check(None, &Rule::authenticated()),
            Err(ApiError::LoginRequired)
        ));
    }

    #[test]
    fn test_user_rule() {
        let alice = user(1);
        assert!(Rule::user(1).evaluate(&alice));
        assert!(matches!(
            check(Some(&alice), &Rule::user(2)),
            Err(ApiError::PermissionDenied)
        ));
    }

    #[test]
    fn test_any_and_all() {
        let alice = user(1);
        let any = Rule::Any(vec![Rule::user(2), Rule::user(1)]);
        let all = Rule::All(vec![Rule::user(2), Rule::user(1)]);
        assert!(any.evaluate(&alice));
        assert!(!all.evaluate(&alice));
        assert!(Rule::All(vec![]).evaluate(&alice));
    }

    #[test]
    fn test_custom_predicate() {
        let even = Rule::check(|u| u.user_id % 2 == 0);
        assert!(even.evaluate(&user(4)));
        assert!(!even.evaluate(&user(5)));
        assert_eq!(format!("{:?}", even), "Check(..)");
    }

    #[test]
    fn test_is_permitted_never_fails() {
        assert!(!is_permitted(None, &Rule::authenticated()));
        assert!(is_permitted(Some(&user(3)), &Rule::user(3)));
    }
}
