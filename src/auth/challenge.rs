use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("challenge token missing")]
    MissingToken,

    #[error("challenge rejected")]
    Rejected,
}

/// Invisible human-verification check that gates sending a one-time code.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), ChallengeError>;
}

/// Accepts any non-empty token, or only `secret` when one is configured.
pub struct LocalChallengeVerifier {
    secret: Option<String>,
}

impl LocalChallengeVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl ChallengeVerifier for LocalChallengeVerifier {
    async fn verify(&self, token: &str) -> Result<(), ChallengeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ChallengeError::MissingToken);
        }
        match &self.secret {
            Some(secret) if secret != token => Err(ChallengeError::Rejected),
            _ => Ok(()),
        }
    }
}

/// One challenge instance bound to a single sign-in attempt.
pub struct ChallengeWidget {
    id: Uuid,
    verifier: Arc<dyn ChallengeVerifier>,
}

impl ChallengeWidget {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn solve(&self, token: &str) -> Result<(), ChallengeError> {
        let result = self.verifier.verify(token).await;
        if let Err(err) = &result {
            tracing::debug!(widget = %self.id, error = %err, "challenge not solved");
        }
        result
    }
}

/// Owner of at most one [`ChallengeWidget`]: created on first use, reused for
/// resends, dropped by [`ChallengeSlot::teardown`].
#[derive(Default)]
pub struct ChallengeSlot {
    widget: Option<Arc<ChallengeWidget>>,
}

impl ChallengeSlot {
    pub fn get_or_init(&mut self, verifier: &Arc<dyn ChallengeVerifier>) -> Arc<ChallengeWidget> {
        let widget = self.widget.get_or_insert_with(|| {
            let widget = ChallengeWidget {
                id: Uuid::new_v4(),
                verifier: Arc::clone(verifier),
            };
            tracing::debug!(widget = %widget.id, "challenge widget initialised");
            Arc::new(widget)
        });
        Arc::clone(widget)
    }

    pub fn teardown(&mut self) {
        if let Some(widget) = self.widget.take() {
            tracing::debug!(widget = %widget.id, "challenge widget torn down");
        }
    }

    pub fn is_active(&self) -> bool {
        self.widget.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn widget_is_created_once_and_cleared_on_teardown() {
        let verifier: Arc<dyn ChallengeVerifier> = Arc::new(LocalChallengeVerifier::new(None));
        let mut slot = ChallengeSlot::default();
        assert!(!slot.is_active());

        let first = slot.get_or_init(&verifier);
        let second = slot.get_or_init(&verifier);
        assert_eq!(first.id(), second.id());
        assert!(first.solve("token").await.is_ok());

        slot.teardown();
        assert!(!slot.is_active());
        let third = slot.get_or_init(&verifier);
        assert_ne!(third.id(), first.id());
    }

    #[tokio::test]
    async fn configured_secret_must_match() {
        let verifier = LocalChallengeVerifier::new(Some("letmein".into()));
        assert_eq!(verifier.verify("").await, Err(ChallengeError::MissingToken));
        assert_eq!(verifier.verify("nope").await, Err(ChallengeError::Rejected));
        assert_eq!(verifier.verify("letmein").await, Ok(()));
    }
}
