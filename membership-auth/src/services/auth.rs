use std::sync::Arc;

use crate::{
    dtos::{
        auth::{RegisterRequest, ResetPasswordRequest},
        officer::CreateOfficerRequest,
    },
    models::{normalize_email, Identity, Officer, OrganizationalLevel, User},
    services::{
        reset_token::generate_token_value,
        store::{CredentialStore, ResetTokenStore, StoreError},
        AuthorizationPolicy, Claims, EmailProvider, JwtService, ResetTokenManager, ServiceError,
        TOKEN_TTL_HOURS,
    },
    utils::{hash_password_blocking, verify_password_blocking, Clock, Password, PasswordHashString},
};

/// Answer to every forgot-password request, whatever happened behind it.
pub const PASSWORD_RESET_ACK: &str =
    "If your email is registered, you will receive a password reset link";

/// Successful login: the signed token and who it was issued to.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
    pub identity: Identity,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    reset_tokens: ResetTokenManager,
    jwt: JwtService,
    email: Arc<dyn EmailProvider>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<dyn ResetTokenStore>,
        jwt: JwtService,
        email: Arc<dyn EmailProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let reset_tokens = ResetTokenManager::new(tokens, credentials.clone(), clock.clone());
        Self {
            credentials,
            reset_tokens,
            jwt,
            email,
            clock,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User, ServiceError> {
        let email = normalize_email(&req.email);

        if self.credentials.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password_blocking(Password::new(req.password)).await?;
        let user = User::new(
            email,
            password_hash.into_string(),
            req.full_name.trim().to_string(),
            self.clock.now(),
        );

        self.credentials.insert_user(&user).await.map_err(|e| match e {
            // lost a race with a concurrent registration
            StoreError::Duplicate(_) => ServiceError::EmailAlreadyRegistered,
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Identity-only login; no officer lookup.
    pub async fn login(&self, email: &str, password: String) -> Result<LoginOutcome, ServiceError> {
        let user = self.authenticate(email, password).await?;
        let identity = user.identity();
        let outcome = self.issue(user, identity)?;
        tracing::info!(user_id = %outcome.user.id, "User logged in");
        Ok(outcome)
    }

    /// Login that requires an active officer position and puts its level and
    /// job title into the token.
    pub async fn login_as_officer(
        &self,
        email: &str,
        password: String,
    ) -> Result<LoginOutcome, ServiceError> {
        let user = self.authenticate(email, password).await?;

        let Some(officer) = self.credentials.find_officer_by_user_id(user.id).await? else {
            tracing::info!(user_id = %user.id, "Officer login without an active position");
            return Err(ServiceError::InvalidCredentials);
        };

        let identity = Identity {
            level: Some(officer.level),
            job_title: Some(officer.job_title),
            ..user.identity()
        };
        let outcome = self.issue(user, identity)?;
        tracing::info!(
            user_id = %outcome.user.id,
            level = %officer.level,
            "Officer logged in"
        );
        Ok(outcome)
    }

    /// Always answers [`PASSWORD_RESET_ACK`] unless the random source fails.
    ///
    /// The token value is drawn before the email lookup so that even that
    /// failure is independent of whether the account exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str, ServiceError> {
        let value = generate_token_value()?;
        let email = normalize_email(email);

        let user = match self.credentials.find_user_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!("Password reset requested for unknown email");
                return Ok(PASSWORD_RESET_ACK);
            }
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during password reset request");
                return Ok(PASSWORD_RESET_ACK);
            }
        };

        if let Err(e) = self.reset_tokens.store_value(user.id, value.clone()).await {
            tracing::error!(error = %e, user_id = %user.id, "Failed to store reset token");
            return Ok(PASSWORD_RESET_ACK);
        }

        if let Err(e) = self.email.send_password_reset_email(&user.email, &value).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to send password reset email");
        }

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(PASSWORD_RESET_ACK)
    }

    pub async fn complete_password_reset(&self, req: ResetPasswordRequest) -> Result<(), ServiceError> {
        if req.token.trim().is_empty() {
            return Err(ServiceError::TokenNotFound);
        }

        let digest = hash_password_blocking(Password::new(req.new_password)).await?;
        self.reset_tokens.consume(req.token.trim(), &digest).await?;
        Ok(())
    }

    /// Create an officer position for an existing user on behalf of `actor`.
    pub async fn create_officer(
        &self,
        actor: &Claims,
        req: CreateOfficerRequest,
    ) -> Result<Officer, ServiceError> {
        let level: OrganizationalLevel = req
            .level
            .parse()
            .map_err(|e: crate::models::ParseLevelError| ServiceError::InvalidLevel(e.0))?;

        if let Err(e) = AuthorizationPolicy::authorize_officer_creation(actor, level, &req.placement) {
            tracing::info!(
                actor = %actor.user_id,
                target_level = %level,
                reason = %e,
                "Officer creation refused"
            );
            return Err(e.into());
        }

        if self.credentials.find_user_by_id(req.user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let officer = Officer::new(req.user_id, level, req.placement, req.job_title, self.clock.now());
        let id = self.credentials.insert_officer(&officer).await?;

        tracing::info!(
            actor = %actor.user_id,
            pengurus_id = %id,
            user_id = %officer.user_id,
            level = %level,
            "Pengurus created"
        );
        Ok(Officer { id, ..officer })
    }

    pub async fn purge_expired_reset_tokens(&self) -> Result<u64, ServiceError> {
        self.reset_tokens.purge_expired().await
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.credentials.health_check().await?;
        Ok(())
    }

    /// Unknown emails are checked against a dummy digest so they cost the same
    /// as a wrong password.
    async fn authenticate(&self, email: &str, password: String) -> Result<User, ServiceError> {
        let user = self.credentials.find_user_by_email(&normalize_email(email)).await?;

        let digest = user
            .as_ref()
            .map(|u| PasswordHashString::new(u.password_hash.clone()))
            .unwrap_or_else(PasswordHashString::dummy);
        let matches = verify_password_blocking(Password::new(password), digest).await;

        match user {
            Some(user) if matches && user.active => Ok(user),
            Some(user) if matches => {
                tracing::info!(user_id = %user.id, "Login attempt for inactive user");
                Err(ServiceError::InvalidCredentials)
            }
            _ => Err(ServiceError::InvalidCredentials),
        }
    }

    fn issue(&self, user: User, identity: Identity) -> Result<LoginOutcome, ServiceError> {
        let token = self.jwt.issue(&identity)?;
        Ok(LoginOutcome {
            token,
            expires_in: TOKEN_TTL_HOURS * 3600,
            user,
            identity,
        })
    }
}
