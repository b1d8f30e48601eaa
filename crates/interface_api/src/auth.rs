//! Authentication and branch authorization
//!
//! A verified token becomes a [`RequestContext`]; handlers then gate every
//! branch-scoped route with [`require_branch`].

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::{BranchId, UserId};
use domain_case::{BranchScope, RequestContext, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Staff role: admin, manager or staff
    pub role: String,
    /// Branches the user is assigned to; ignored for admins
    #[serde(default)]
    pub branches: Vec<Uuid>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Builds the request context the domain handlers expect
    pub fn to_context(&self) -> Result<RequestContext, AuthError> {
        let actor: UserId = self
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidClaims("sub is not a user id".to_string()))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| AuthError::InvalidClaims(format!("unknown role: {}", self.role)))?;

        let scope = match role {
            Role::Admin => BranchScope::All,
            _ => BranchScope::Only(self.branches.iter().copied().map(BranchId::from).collect()),
        };

        Ok(RequestContext::new(actor, role, scope))
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `role` - Staff role
/// * `branches` - Assigned branches
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: UserId,
    role: Role,
    branches: &[BranchId],
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: Uuid::from(user_id).to_string(),
        role: role.as_str().to_string(),
        branches: branches.iter().copied().map(Uuid::from).collect(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Fails unless the caller may act on `branch_id`
pub fn require_branch(ctx: &RequestContext, branch_id: BranchId) -> Result<(), AuthError> {
    if ctx.can_access(branch_id) {
        Ok(())
    } else {
        Err(AuthError::MissingPermission(format!("branch {}", branch_id)))
    }
}

/// Fails unless the caller may change branch settings
pub fn require_settings(ctx: &RequestContext) -> Result<(), AuthError> {
    if ctx.can_manage_settings() {
        Ok(())
    } else {
        Err(AuthError::MissingPermission("settings".to_string()))
    }
}

/// Fails unless the caller is an administrator
pub fn require_admin(ctx: &RequestContext) -> Result<(), AuthError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(AuthError::MissingPermission("admin".to_string()))
    }
}
