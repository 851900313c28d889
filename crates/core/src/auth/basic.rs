//! HTTP Basic authentication.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Validates `Authorization: Basic <base64(user:password)>` against a single
/// configured account.
pub struct BasicAuthenticator {
    username: String,
    password: String,
}

impl BasicAuthenticator {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Decodes the credentials of a Basic authorization header.
    fn credentials(header: &str) -> Result<(String, String), AuthError> {
        let (scheme, encoded) = header
            .trim()
            .split_once(' ')
            .ok_or_else(|| AuthError::InvalidCredentials("Malformed authorization header".into()))?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::NotAuthenticated);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| AuthError::InvalidCredentials("Credentials are not valid base64".into()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthError::InvalidCredentials("Credentials are not valid UTF-8".into()))?;

        decoded
            .split_once(':')
            .map(|(user, pass)| (user.to_string(), pass.to_string()))
            .ok_or_else(|| AuthError::InvalidCredentials("Missing ':' in credentials".into()))
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let header = request
            .header("authorization")
            .ok_or(AuthError::NotAuthenticated)?;
        let (user, pass) = Self::credentials(header)?;

        // Both comparisons always run
        let user_ok = constant_time_eq(user.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(pass.as_bytes(), self.password.as_bytes());

        if user_ok & pass_ok {
            Ok(Identity {
                user,
                method: "basic",
            })
        } else {
            Err(AuthError::InvalidCredentials(
                "Invalid username or password".to_string(),
            ))
        }
    }

    fn method_name(&self) -> &'static str {
        "basic"
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request(authorization: Option<&str>) -> AuthRequest {
        let mut headers = HashMap::new();
        if let Some(value) = authorization {
            headers.insert("authorization".to_string(), value.to_string());
        }
        AuthRequest {
            headers,
            source_ip: "127.0.0.1".parse().unwrap(),
        }
    }

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
    }

    fn authenticator() -> BasicAuthenticator {
        BasicAuthenticator::new("tinfoil".into(), "roms123".into())
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let identity = authenticator()
            .authenticate(&request(Some(&basic("tinfoil", "roms123"))))
            .await
            .unwrap();
        assert_eq!(identity.user, "tinfoil");
        assert_eq!(identity.method, "basic");
    }

    #[tokio::test]
    async fn test_lowercase_scheme() {
        let header = basic("tinfoil", "roms123").replacen("Basic", "basic", 1);
        assert!(authenticator().authenticate(&request(Some(&header))).await.is_ok());
    }

    #[tokio::test]
    async fn test_password_with_colon() {
        let auth = BasicAuthenticator::new("u".into(), "a:b".into());
        assert!(auth.authenticate(&request(Some(&basic("u", "a:b")))).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let result = authenticator()
            .authenticate(&request(Some(&basic("tinfoil", "nope"))))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let result = authenticator().authenticate(&request(None)).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_other_scheme() {
        let result = authenticator()
            .authenticate(&request(Some("Bearer abc")))
            .await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_garbage_base64() {
        let result = authenticator()
            .authenticate(&request(Some("Basic !!!")))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
