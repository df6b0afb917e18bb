use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::challenge::{ChallengeError, ChallengeSlot, ChallengeVerifier};
use super::provider::{AuthAccount, AuthProvider, AuthProviderError, ConfirmationHandle};
use crate::error::AppError;

/// Wrong codes allowed per attempt before it is discarded.
pub const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PhoneFlowState {
    EnteringPhone,
    OtpSent,
    Verifying,
    Authenticated,
}

/// A `+<country><10 digits>` number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    country_code: String,
    national: String,
}

impl PhoneNumber {
    /// Accepts exactly ten national digits; spaces and dashes are ignored.
    pub fn parse(country_code: &str, number: &str) -> Option<Self> {
        let country_code = country_code.trim().trim_start_matches('+');
        if country_code.is_empty()
            || country_code.len() > 3
            || !country_code.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let national: String = number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if national.len() != 10 || !national.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            country_code: country_code.to_string(),
            national,
        })
    }

    pub fn e164(&self) -> String {
        format!("+{}{}", self.country_code, self.national)
    }
}

pub fn is_otp_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Error)]
pub enum PhoneFlowError {
    #[error("invalid phone number")]
    InvalidPhone,

    #[error("invalid code format")]
    InvalidCodeFormat,

    #[error("unknown or expired sign-in attempt")]
    UnknownFlow,

    #[error("sign-in attempt is {actual:?}, expected {expected:?}")]
    WrongState {
        expected: PhoneFlowState,
        actual: PhoneFlowState,
    },

    #[error("challenge failed")]
    Challenge(#[from] ChallengeError),

    #[error("wrong code")]
    WrongCode,

    #[error("code expired")]
    CodeExpired,

    #[error("too many wrong codes")]
    TooManyAttempts,

    #[error("auth provider failure")]
    Provider(#[source] AuthProviderError),
}

impl From<PhoneFlowError> for AppError {
    fn from(err: PhoneFlowError) -> Self {
        match err {
            PhoneFlowError::InvalidPhone => {
                AppError::BadRequest("Please enter a valid 10-digit phone number".into())
            }
            PhoneFlowError::InvalidCodeFormat => {
                AppError::BadRequest("Please enter a valid 6-digit OTP".into())
            }
            PhoneFlowError::UnknownFlow => {
                AppError::BadRequest("Sign-in attempt expired. Please start again.".into())
            }
            PhoneFlowError::WrongState { .. } => AppError::Conflict(err.to_string()),
            PhoneFlowError::Challenge(_) => {
                AppError::BadRequest("Human verification failed. Please try again.".into())
            }
            PhoneFlowError::WrongCode => AppError::BadRequest("Invalid OTP. Please try again.".into()),
            PhoneFlowError::CodeExpired => {
                AppError::BadRequest("OTP expired. Please request a new code.".into())
            }
            PhoneFlowError::TooManyAttempts => {
                AppError::BadRequest("Too many attempts. Please start again.".into())
            }
            PhoneFlowError::Provider(source) => {
                tracing::error!(error = %source, "phone sign-in provider error");
                AppError::Unavailable("Something went wrong. Please try again.".into())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneFlowView {
    pub flow_id: Uuid,
    pub state: PhoneFlowState,
    pub phone: Option<String>,
}

struct PhoneFlow {
    state: PhoneFlowState,
    phone: Option<PhoneNumber>,
    handle: Option<ConfirmationHandle>,
    failed_attempts: u32,
    challenge: ChallengeSlot,
    touched_at: DateTime<Utc>,
}

impl PhoneFlow {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: PhoneFlowState::EnteringPhone,
            phone: None,
            handle: None,
            failed_attempts: 0,
            challenge: ChallengeSlot::default(),
            touched_at: now,
        }
    }

    fn require(&self, expected: PhoneFlowState) -> Result<(), PhoneFlowError> {
        if self.state != expected {
            return Err(PhoneFlowError::WrongState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn view(&self, flow_id: Uuid) -> PhoneFlowView {
        PhoneFlowView {
            flow_id,
            state: self.state,
            phone: self.phone.as_ref().map(PhoneNumber::e164),
        }
    }
}

/// Server-side state machine for phone sign-in.
///
/// ```text
/// enteringPhone --send--> otpSent --verify--> verifying --ok--> authenticated
///       ^                  |   ^                   |
///       +--change number---+   +------failure------+
/// ```
///
/// Each attempt owns its challenge widget; the widget is torn down when the
/// attempt authenticates or expires. Locks are never held across provider calls.
pub struct PhoneAuthController {
    auth: Arc<dyn AuthProvider>,
    verifier: Arc<dyn ChallengeVerifier>,
    default_country_code: String,
    flow_ttl: Duration,
    flows: Mutex<HashMap<Uuid, PhoneFlow>>,
}

impl PhoneAuthController {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        verifier: Arc<dyn ChallengeVerifier>,
        default_country_code: &str,
        flow_ttl_secs: i64,
    ) -> Self {
        Self {
            auth,
            verifier,
            default_country_code: default_country_code.to_string(),
            flow_ttl: Duration::seconds(flow_ttl_secs),
            flows: Mutex::new(HashMap::new()),
        }
    }

    fn flows(&self) -> MutexGuard<'_, HashMap<Uuid, PhoneFlow>> {
        let mut flows = self.flows.lock().unwrap_or_else(PoisonError::into_inner);
        let cutoff = Utc::now() - self.flow_ttl;
        flows.retain(|id, flow| {
            let live = flow.touched_at > cutoff;
            if !live {
                tracing::debug!(flow = %id, "phone sign-in attempt expired");
                flow.challenge.teardown();
            }
            live
        });
        flows
    }

    pub fn view(&self, flow_id: Uuid) -> Option<PhoneFlowView> {
        self.flows().get(&flow_id).map(|flow| flow.view(flow_id))
    }

    /// `enteringPhone -> otpSent`. Without `flow_id` a new attempt is started.
    pub async fn send_code(
        &self,
        flow_id: Option<Uuid>,
        country_code: Option<&str>,
        number: &str,
        challenge_token: &str,
    ) -> Result<PhoneFlowView, PhoneFlowError> {
        let phone = PhoneNumber::parse(
            country_code.unwrap_or(&self.default_country_code),
            number,
        )
        .ok_or(PhoneFlowError::InvalidPhone)?;

        let id = flow_id.unwrap_or_else(Uuid::new_v4);
        let widget = {
            let mut flows = self.flows();
            if flow_id.is_none() {
                flows.insert(id, PhoneFlow::new(Utc::now()));
            }
            let flow = flows.get_mut(&id).ok_or(PhoneFlowError::UnknownFlow)?;
            flow.require(PhoneFlowState::EnteringPhone)?;
            flow.touched_at = Utc::now();
            flow.challenge.get_or_init(&self.verifier)
        };

        let sent = match widget.solve(challenge_token).await {
            Ok(()) => self
                .auth
                .send_phone_code(&phone.e164())
                .await
                .map_err(PhoneFlowError::Provider),
            Err(err) => Err(err.into()),
        };

        let mut flows = self.flows();
        let handle = match sent {
            Ok(handle) => handle,
            Err(err) => {
                if flow_id.is_none() {
                    if let Some(mut flow) = flows.remove(&id) {
                        flow.challenge.teardown();
                    }
                }
                return Err(err);
            }
        };

        let flow = flows.get_mut(&id).ok_or(PhoneFlowError::UnknownFlow)?;
        flow.require(PhoneFlowState::EnteringPhone)?;
        flow.phone = Some(phone);
        flow.handle = Some(handle);
        flow.state = PhoneFlowState::OtpSent;
        flow.touched_at = Utc::now();
        tracing::info!(flow = %id, "one-time code sent");
        Ok(flow.view(id))
    }

    /// Re-runs the challenge and sends a fresh code to the same number.
    pub async fn resend(
        &self,
        flow_id: Uuid,
        challenge_token: &str,
    ) -> Result<PhoneFlowView, PhoneFlowError> {
        let (widget, phone) = {
            let mut flows = self.flows();
            let flow = flows.get_mut(&flow_id).ok_or(PhoneFlowError::UnknownFlow)?;
            flow.require(PhoneFlowState::OtpSent)?;
            let phone = flow.phone.clone().ok_or(PhoneFlowError::UnknownFlow)?;
            flow.touched_at = Utc::now();
            (flow.challenge.get_or_init(&self.verifier), phone)
        };

        widget.solve(challenge_token).await?;
        let handle = self
            .auth
            .send_phone_code(&phone.e164())
            .await
            .map_err(PhoneFlowError::Provider)?;

        let mut flows = self.flows();
        let flow = flows.get_mut(&flow_id).ok_or(PhoneFlowError::UnknownFlow)?;
        flow.require(PhoneFlowState::OtpSent)?;
        flow.handle = Some(handle);
        flow.touched_at = Utc::now();
        tracing::info!(flow = %flow_id, "one-time code re-sent");
        Ok(flow.view(flow_id))
    }

    /// `otpSent -> enteringPhone`; the pending code is abandoned.
    pub fn change_number(&self, flow_id: Uuid) -> Result<PhoneFlowView, PhoneFlowError> {
        let mut flows = self.flows();
        let flow = flows.get_mut(&flow_id).ok_or(PhoneFlowError::UnknownFlow)?;
        flow.require(PhoneFlowState::OtpSent)?;
        flow.state = PhoneFlowState::EnteringPhone;
        flow.phone = None;
        flow.handle = None;
        flow.failed_attempts = 0;
        flow.touched_at = Utc::now();
        Ok(flow.view(flow_id))
    }

    /// `otpSent -> verifying -> authenticated`, falling back to `otpSent` on failure.
    /// A successful attempt is removed and its challenge torn down, as is one
    /// that reaches [`MAX_CODE_ATTEMPTS`] wrong codes.
    pub async fn verify_code(
        &self,
        flow_id: Uuid,
        code: &str,
    ) -> Result<AuthAccount, PhoneFlowError> {
        let code = code.trim();
        if !is_otp_code(code) {
            return Err(PhoneFlowError::InvalidCodeFormat);
        }

        let handle = {
            let mut flows = self.flows();
            let flow = flows.get_mut(&flow_id).ok_or(PhoneFlowError::UnknownFlow)?;
            flow.require(PhoneFlowState::OtpSent)?;
            let handle = flow.handle.clone().ok_or(PhoneFlowError::UnknownFlow)?;
            flow.state = PhoneFlowState::Verifying;
            flow.touched_at = Utc::now();
            handle
        };

        let result = self.auth.confirm_phone_code(&handle, code).await;

        let exhausted = {
            let mut flows = self.flows();
            match result {
                Ok(account) => {
                    if let Some(mut flow) = flows.remove(&flow_id) {
                        flow.challenge.teardown();
                    }
                    tracing::info!(flow = %flow_id, uid = %account.uid, "phone sign-in verified");
                    return Ok(account);
                }
                Err(AuthProviderError::InvalidCode) => {
                    let attempts = match flows.get_mut(&flow_id) {
                        Some(flow) => {
                            flow.failed_attempts += 1;
                            flow.state = PhoneFlowState::OtpSent;
                            flow.failed_attempts
                        }
                        None => return Err(PhoneFlowError::WrongCode),
                    };
                    if attempts < MAX_CODE_ATTEMPTS {
                        return Err(PhoneFlowError::WrongCode);
                    }
                    if let Some(mut flow) = flows.remove(&flow_id) {
                        flow.challenge.teardown();
                    }
                    tracing::warn!(flow = %flow_id, attempts, "phone sign-in locked after wrong codes");
                    handle
                }
                Err(err) => {
                    if let Some(flow) = flows.get_mut(&flow_id) {
                        flow.state = PhoneFlowState::OtpSent;
                    }
                    return Err(match err {
                        AuthProviderError::CodeExpired => PhoneFlowError::CodeExpired,
                        other => PhoneFlowError::Provider(other),
                    });
                }
            }
        };

        self.auth.discard_phone_code(&exhausted).await;
        Err(PhoneFlowError::TooManyAttempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ten_digit_numbers_only() {
        let phone = PhoneNumber::parse("91", "98765 43210").unwrap();
        assert_eq!(phone.e164(), "+919876543210");
        assert_eq!(PhoneNumber::parse("+1", "555-010-4477").unwrap().e164(), "+15550104477");

        assert!(PhoneNumber::parse("91", "987654321").is_none());
        assert!(PhoneNumber::parse("91", "98765432100").is_none());
        assert!(PhoneNumber::parse("91", "98765abcde").is_none());
        assert!(PhoneNumber::parse("", "9876543210").is_none());
    }

    #[test]
    fn otp_codes_are_six_digits() {
        assert!(is_otp_code("012345"));
        assert!(!is_otp_code("12345"));
        assert!(!is_otp_code("1234567"));
        assert!(!is_otp_code("12a456"));
    }
}
