//! Identity-provider capability.
//!
//! The shell owns the actual SDK (FirebaseAuth + AuthenticationServices);
//! the core only speaks this operation protocol. `Listen` is a streamed
//! request the shell resolves once per auth-state change, and it is the
//! single source of truth for the authenticated/unauthenticated transition.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AuthUser;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FederatedProvider {
    Apple,
    Google,
}

impl FederatedProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apple => "apple",
            Self::Google => "google",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum AuthOperation {
    SignIn {
        email: String,
        password: String,
    },
    CreateUser {
        email: String,
        password: String,
    },
    /// Run the platform authorization UI. For Apple the request carries the
    /// SHA-256 digest of a single-use nonce; the raw value never leaves the
    /// core until the credential exchange.
    FederatedAuthorize {
        provider: FederatedProvider,
        nonce_sha256: Option<String>,
    },
    FederatedSignIn {
        provider: FederatedProvider,
        id_token: String,
        raw_nonce: Option<String>,
    },
    SignOut,
    DeleteAccount,
    Listen,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AuthError {
    #[error("invalid credential")]
    InvalidCredential,

    #[error("network failure: {message}")]
    Network { message: String },

    #[error("password rejected by provider policy")]
    WeakPassword,

    #[error("account already exists")]
    AccountExists,

    #[error("credential revoked")]
    Revoked,

    #[error("auth failure: {message}")]
    Unknown { message: String },
}

impl AuthError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum AuthOutput {
    SignedIn { user: AuthUser },
    Assertion { id_token: String },
    SignedOut,
    Deleted,
    Session { user: Option<AuthUser> },
}

pub type AuthResult = Result<AuthOutput, AuthError>;

impl Operation for AuthOperation {
    type Output = AuthResult;
}

pub struct Auth<Ev> {
    context: CapabilityContext<AuthOperation, Ev>,
}

impl<Ev> Capability<Ev> for Auth<Ev> {
    type Operation = AuthOperation;
    type MappedSelf<MappedEv> = Auth<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Auth::new(self.context.map_event(f))
    }
}

impl<Ev> Auth<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AuthOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn sign_in<F>(&self, email: String, password: String, callback: F)
    where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        self.request(AuthOperation::SignIn { email, password }, callback);
    }

    pub fn create_user<F>(&self, email: String, password: String, callback: F)
    where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        self.request(AuthOperation::CreateUser { email, password }, callback);
    }

    pub fn federated_authorize<F>(
        &self,
        provider: FederatedProvider,
        nonce_sha256: Option<String>,
        callback: F,
    ) where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        self.request(
            AuthOperation::FederatedAuthorize {
                provider,
                nonce_sha256,
            },
            callback,
        );
    }

    pub fn federated_sign_in<F>(
        &self,
        provider: FederatedProvider,
        id_token: String,
        raw_nonce: Option<String>,
        callback: F,
    ) where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        self.request(
            AuthOperation::FederatedSignIn {
                provider,
                id_token,
                raw_nonce,
            },
            callback,
        );
    }

    pub fn sign_out<F>(&self, callback: F)
    where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        self.request(AuthOperation::SignOut, callback);
    }

    pub fn delete_account<F>(&self, callback: F)
    where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        self.request(AuthOperation::DeleteAccount, callback);
    }

    /// Subscribe to the provider's auth-state stream. The shell resolves the
    /// request once per change (sign-in anywhere, sign-out, remote
    /// revocation); the subscription lives for the rest of the core's life,
    /// so callers must register it exactly once.
    pub fn listen<F>(&self, make_event: F)
    where
        F: Fn(Option<AuthUser>) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut updates = ctx.stream_from_shell(AuthOperation::Listen);
            while let Some(result) = updates.next().await {
                let user = match result {
                    Ok(AuthOutput::Session { user }) => user,
                    // A failed subscription means the session is over.
                    Err(_) => None,
                    Ok(_) => {
                        tracing::warn!("unexpected output on auth session stream");
                        continue;
                    }
                };
                ctx.update_app(make_event(user));
            }
        });
    }

    fn request<F>(&self, operation: AuthOperation, callback: F)
    where
        F: Fn(AuthResult) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    #[test]
    fn operation_serialization_round_trips() {
        let op = AuthOperation::FederatedAuthorize {
            provider: FederatedProvider::Apple,
            nonce_sha256: Some("aa".repeat(32)),
        };
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: AuthOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }

    #[test]
    fn session_output_serialization_round_trips() {
        let output: AuthResult = Ok(AuthOutput::Session {
            user: Some(AuthUser {
                uid: UserId::new("uid-1"),
                email: Some("user@example.com".into()),
            }),
        });
        let json = serde_json::to_string(&output).unwrap();
        let deserialized: AuthResult = serde_json::from_str(&json).unwrap();
        assert_eq!(output, deserialized);
    }

    #[test]
    fn error_serialization_round_trips() {
        let error = AuthError::Network {
            message: "offline".into(),
        };
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: AuthError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn only_network_failures_are_retryable() {
        assert!(AuthError::Network { message: "x".into() }.is_retryable());
        assert!(!AuthError::InvalidCredential.is_retryable());
        assert!(!AuthError::AccountExists.is_retryable());
        assert!(!AuthError::Revoked.is_retryable());
    }
}
