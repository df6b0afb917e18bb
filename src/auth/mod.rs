//! Identity boundary: the auth provider, the human-verification challenge,
//! the phone sign-in state machine and session tokens.

pub mod challenge;
pub mod local;
pub mod phone;
pub mod provider;
pub mod session;

pub use challenge::{ChallengeVerifier, LocalChallengeVerifier};
pub use local::LocalAuthProvider;
pub use phone::{PhoneAuthController, PhoneFlowState};
pub use provider::{AuthAccount, AuthProvider, AuthProviderError, ConfirmationHandle};
pub use session::{Claims, SessionTokens};
