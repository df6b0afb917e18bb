use std::sync::Arc;

use crate::{
    auth::{
        AuthProvider, ChallengeVerifier, LocalAuthProvider, LocalChallengeVerifier,
        PhoneAuthController, SessionTokens,
    },
    config::AppConfig,
    store::DocumentStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: Arc<SessionTokens>,
    pub phone: Arc<PhoneAuthController>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        verifier: Arc<dyn ChallengeVerifier>,
    ) -> Self {
        let sessions = SessionTokens::new(&config.session.jwt_secret, config.session.ttl_hours);
        let phone = PhoneAuthController::new(
            Arc::clone(&auth),
            verifier,
            &config.default_country_code,
            config.otp_ttl_secs,
        );
        Self {
            store,
            auth,
            sessions: Arc::new(sessions),
            phone: Arc::new(phone),
            config: Arc::new(config),
        }
    }

    /// Wires the in-process auth provider and challenge verifier over `store`.
    pub fn local(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuthProvider::new(
            Arc::clone(&store),
            &config.public_base_url,
            config.otp_ttl_secs,
        ));
        let verifier: Arc<dyn ChallengeVerifier> =
            Arc::new(LocalChallengeVerifier::new(config.challenge_secret.clone()));
        Self::new(config, store, auth, verifier)
    }
}
