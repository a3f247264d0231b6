use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::{errors::InputIssue, repo_types::User};

const MIN_PASSWORD_CHARS: usize = 6;
const MIN_NAME_CHARS: usize = 2;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_email(email: &str, issues: &mut Vec<InputIssue>) {
    if !is_valid_email(email) {
        issues.push(InputIssue::new("email", "Email inválido"));
    }
}

fn check_password(password: &str, issues: &mut Vec<InputIssue>) {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        issues.push(InputIssue::new(
            "password",
            "La contraseña debe tener al menos 6 caracteres",
        ));
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login input after validation.
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<LoginInput, Vec<InputIssue>> {
        let mut issues = Vec::new();
        check_email(&self.email, &mut issues);
        check_password(&self.password, &mut issues);
        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(LoginInput {
            email: self.email,
            password: self.password,
        })
    }
}

/// Request body for registration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Registration input after validation; the confirmation has been consumed.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<RegisterInput, Vec<InputIssue>> {
        let mut issues = Vec::new();
        if self.name.chars().count() < MIN_NAME_CHARS {
            issues.push(InputIssue::new(
                "name",
                "El nombre debe tener al menos 2 caracteres",
            ));
        }
        check_email(&self.email, &mut issues);
        check_password(&self.password, &mut issues);
        if !issues.is_empty() {
            return Err(issues);
        }
        // Confirmation is only compared once the fields themselves are valid.
        if self.password != self.confirm_password {
            return Err(vec![InputIssue::new(
                "confirmPassword",
                "Las contraseñas no coinciden",
            )]);
        }
        Ok(RegisterInput {
            name: self.name,
            email: self.email,
            password: self.password,
        })
    }
}

/// Result payload shared by all actions.
#[derive(Debug, Serialize)]
pub struct ActionOutput {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}
