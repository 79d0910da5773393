//! Admin Basic-Auth check.

use base64::Engine;

/// Admin credentials from configuration. Both must be set for the admin
/// surface to work at all.
#[derive(Clone)]
pub struct AdminAuth {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials unset on the server. Maps to HTTP 500 so operators can
    /// tell "not set up" apart from "wrong password" in logs.
    Misconfigured,
    /// Missing, malformed, or wrong credentials. Maps to HTTP 401.
    Unauthorized,
}

/// Validate an `Authorization: Basic ...` header value against the
/// configured credentials. Comparison is constant-time.
pub fn check_basic_auth(auth: &AdminAuth, header: Option<&str>) -> Result<(), AuthError> {
    let (expected_user, expected_password) = match (&auth.username, &auth.password) {
        (Some(u), Some(p)) => (u, p),
        _ => return Err(AuthError::Misconfigured),
    };

    let encoded = header
        .and_then(|h| h.strip_prefix("Basic "))
        .ok_or(AuthError::Unauthorized)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::Unauthorized)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Unauthorized)?;
    let (user, password) = decoded.split_once(':').ok_or(AuthError::Unauthorized)?;

    // Evaluate both comparisons before branching.
    let user_ok = constant_time_eq(user.as_bytes(), expected_user.as_bytes());
    let password_ok = constant_time_eq(password.as_bytes(), expected_password.as_bytes());
    if user_ok && password_ok {
        Ok(())
    } else {
        Err(AuthError::Unauthorized)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AdminAuth {
        AdminAuth {
            username: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
        }
    }

    fn basic(user: &str, password: &str) -> String {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"))
        )
    }

    #[test]
    fn unset_credentials_are_misconfiguration() {
        let auth = AdminAuth { username: None, password: None };
        assert_eq!(
            check_basic_auth(&auth, Some(&basic("admin", "hunter2"))),
            Err(AuthError::Misconfigured)
        );

        let half = AdminAuth {
            username: Some("admin".to_string()),
            password: None,
        };
        assert_eq!(
            check_basic_auth(&half, Some(&basic("admin", "hunter2"))),
            Err(AuthError::Misconfigured)
        );
    }

    #[test]
    fn valid_credentials_pass() {
        assert_eq!(check_basic_auth(&configured(), Some(&basic("admin", "hunter2"))), Ok(()));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        assert_eq!(
            check_basic_auth(&configured(), Some(&basic("admin", "wrong"))),
            Err(AuthError::Unauthorized)
        );
    }

    #[test]
    fn wrong_username_is_unauthorized() {
        assert_eq!(
            check_basic_auth(&configured(), Some(&basic("root", "hunter2"))),
            Err(AuthError::Unauthorized)
        );
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        assert_eq!(check_basic_auth(&configured(), None), Err(AuthError::Unauthorized));
        assert_eq!(
            check_basic_auth(&configured(), Some("Bearer token")),
            Err(AuthError::Unauthorized)
        );
        assert_eq!(
            check_basic_auth(&configured(), Some("Basic !!notbase64!!")),
            Err(AuthError::Unauthorized)
        );
    }
}
