use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo_types::{NewUser, User},
};
use crate::cart::repo_types::CartItem;
use crate::error::{AppError, AppResult, FieldError};
use crate::store::Store;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims and validates a registration; returns every failing field.
pub fn validate_registration(req: &RegisterRequest) -> Result<NewUserInput, Vec<FieldError>> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push(FieldError { field: "name", message: "Name is required" });
    } else if name.chars().count() < MIN_NAME_LEN {
        errors.push(FieldError { field: "name", message: "Name must be at least 2 characters" });
    }
    if !is_valid_email(&email) {
        errors.push(FieldError { field: "email", message: "Please include a valid email" });
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError { field: "password", message: "Password must be at least 6 characters" });
    }

    if errors.is_empty() {
        Ok(NewUserInput { name, email })
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserInput {
    pub name: String,
    pub email: String,
}

pub async fn register(store: &dyn Store, keys: &JwtKeys, req: RegisterRequest) -> AppResult<(User, String)> {
    let input = validate_registration(&req).map_err(|fields| {
        warn!(count = fields.len(), "registration rejected");
        AppError::Validation(fields)
    })?;

    if store.find_user_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .create_user(NewUser { name: input.name, email: input.email, password_hash })
        .await?;
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((user, token))
}

pub async fn login(store: &dyn Store, keys: &JwtKeys, req: LoginRequest) -> AppResult<(User, String)> {
    let email = normalize_email(&req.email);
    let mut errors = Vec::new();
    if !is_valid_email(&email) {
        errors.push(FieldError { field: "email", message: "Please include a valid email" });
    }
    if req.password.is_empty() {
        errors.push(FieldError { field: "password", message: "Password is required" });
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid email or password"));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid email or password"));
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((user, token))
}

/// Checks a cart sent by the client before it replaces the saved one.
pub fn validate_cart(items: &[CartItem]) -> Result<(), AppError> {
    if items.iter().any(|i| i.quantity < 1) {
        return Err(AppError::BadRequest("Cart quantities must be at least 1".into()));
    }
    Ok(())
}
