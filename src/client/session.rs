//! Client-side session gate.
//!
//! The token is decoded here *without* checking its signature. The result only
//! drives what the UI shows; every authorization decision happens on the
//! server in [`crate::auth::middleware::require_auth`].

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{
    api::{ApiClient, ClientError},
    store::TokenStore,
};
use crate::auth::{dto::LoginResponse, Claims};

/// Where unauthenticated users are sent.
pub const ENTRY_ROUTE: &str = "/";

/// Reads the payload of a JWT without verifying it. `None` if undecodable.
pub fn decode_unverified(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub is_authenticated: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    Loading,
    Redirect(&'static str),
    Render,
}

pub struct SessionGate<S> {
    store: S,
    claims: Option<Claims>,
    loading: bool,
}

impl<S: TokenStore> SessionGate<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            claims: None,
            loading: true,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The one-shot startup check. Absent, undecodable or expired tokens are
    /// cleared from the store.
    pub fn check(&mut self, now: i64) -> SessionStatus {
        self.claims = match self.store.get() {
            None => None,
            Some(token) => match decode_unverified(&token) {
                Some(claims) if !claims.is_expired_at(now) => Some(claims),
                Some(_) => {
                    debug!("stored token expired");
                    self.discard();
                    None
                }
                None => {
                    debug!("stored token undecodable");
                    self.discard();
                    None
                }
            },
        };
        self.loading = false;
        self.status()
    }

    pub fn check_now(&mut self) -> SessionStatus {
        self.check(OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            is_authenticated: !self.loading && self.claims.is_some(),
            loading: self.loading,
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// What a protected view should do right now.
    pub fn guard(&self) -> GateView {
        let status = self.status();
        if status.loading {
            GateView::Loading
        } else if status.is_authenticated {
            GateView::Render
        } else {
            GateView::Redirect(ENTRY_ROUTE)
        }
    }

    /// Sends the stored token with `client` if the session is authenticated.
    pub fn attach(&self, client: &mut ApiClient) {
        if self.status().is_authenticated {
            if let Some(token) = self.store.get() {
                client.set_token(&token);
            }
        }
    }

    pub fn set_token(&mut self, client: &mut ApiClient, token: &str) -> anyhow::Result<()> {
        self.store.set(token)?;
        client.set_token(token);
        self.claims = decode_unverified(token);
        self.loading = false;
        Ok(())
    }

    pub async fn login(
        &mut self,
        client: &mut ApiClient,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ClientError> {
        let res = client.login(email, password).await?;
        self.set_token(client, &res.access_token)?;
        Ok(res)
    }

    pub fn logout(&mut self, client: &mut ApiClient) -> anyhow::Result<()> {
        client.clear_token();
        self.claims = None;
        self.loading = false;
        self.store.remove()
    }

    fn discard(&mut self) {
        if let Err(e) = self.store.remove() {
            warn!(error = %e, "failed to clear stored token");
        }
    }
}
