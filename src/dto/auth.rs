use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::phone::PhoneFlowView;
use crate::error::AppError;
use crate::models::Role;

/// Email + password, shared by sign-up and sign-in.
#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct CredentialsRequest {
    #[validate(custom(
        function = "validate_email_shape",
        message = "Please enter a valid email address"
    ))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl CredentialsRequest {
    /// Trims and lowercases the email, then checks both fields. The email
    /// message wins when both are wrong.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        self.validate()
            .map_err(|errors| AppError::BadRequest(first_message(&errors, &["email", "password"])))?;
        Ok(self)
    }
}

/// `local@domain.tld`: no whitespace, one `@`, and some dot in the domain
/// with text on both sides of it.
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .char_indices()
                    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("email_shape"))
    }
}

fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let fields = errors.field_errors();
    order
        .iter()
        .filter_map(|name| fields.get(*name))
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub uid: Uuid,
    pub email: String,
    pub verification_sent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub uid: Uuid,
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailQuery {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub authenticated: bool,
    pub uid: Option<Uuid>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendPhoneCodeRequest {
    /// Continue an existing attempt (after "change number"); omit to start one.
    pub flow_id: Option<Uuid>,
    pub country_code: Option<String>,
    pub phone: String,
    pub challenge_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendPhoneCodeRequest {
    pub flow_id: Uuid,
    pub challenge_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneFlowRequest {
    pub flow_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneCodeRequest {
    pub flow_id: Uuid,
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneSignInResponse {
    pub flow: PhoneFlowView,
    pub session: LoginResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(email: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape_matches_local_at_domain_dot_tld() {
        assert!(validate_email_shape("a@b.co").is_ok());
        assert!(validate_email_shape("first.last@mail.example.com").is_ok());
        assert!(validate_email_shape("ab.com").is_err());
        assert!(validate_email_shape("a@bcom").is_err());
        assert!(validate_email_shape("a@.com").is_err());
        assert!(validate_email_shape("a@b.").is_err());
        assert!(validate_email_shape("a@b.c.").is_ok());
        assert!(validate_email_shape("a@.b.c").is_ok());
        assert!(validate_email_shape("a b@c.com").is_err());
        assert!(validate_email_shape("a@b@c.com").is_err());
    }

    #[test]
    fn email_is_checked_before_password() {
        let err = creds("nope", "123").normalized().unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address");

        let err = creds("a@b.com", "12345").normalized().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");

        let ok = creds("  Jane@Example.COM ", "123456").normalized().unwrap();
        assert_eq!(ok.email, "jane@example.com");
    }
}
