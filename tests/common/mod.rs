#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::Value;

use tour_booking_api::{
    auth::{AuthProvider, ChallengeVerifier, LocalChallengeVerifier},
    config::{AdminAccount, AppConfig, ProjectIdentity, SessionConfig, StoreBackend},
    dto::bookings::BookingForm,
    middleware::auth::Principal,
    models::{PackageFields, Role, to_document_data},
    state::AppState,
    store::{Document, DocumentQuery, DocumentStore, MemoryStore, PACKAGES, StoreError},
};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@tours.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";

pub fn test_config() -> AppConfig {
    AppConfig {
        store_backend: StoreBackend::Memory,
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        session: SessionConfig {
            jwt_secret: "test-secret".into(),
            ttl_hours: 1,
        },
        admin: AdminAccount {
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
        },
        project: ProjectIdentity {
            api_key: "key".into(),
            project_id: "tours-test".into(),
            app_id: "app".into(),
        },
        public_base_url: "http://localhost:3000".into(),
        otp_ttl_secs: 300,
        default_country_code: "91".into(),
        challenge_secret: None,
    }
}

pub fn memory_state() -> AppState {
    AppState::local(test_config(), Arc::new(MemoryStore::new()))
}

pub fn state_with(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> AppState {
    let verifier: Arc<dyn ChallengeVerifier> = Arc::new(LocalChallengeVerifier::new(None));
    AppState::new(test_config(), store, auth, verifier)
}

fn principal(state: &AppState, role: Role, email: Option<&str>, phone: Option<&str>) -> Principal {
    let token = state
        .sessions
        .issue(
            Uuid::new_v4(),
            role,
            email.map(str::to_string),
            phone.map(str::to_string),
        )
        .expect("issue token");
    let claims = state
        .sessions
        .verify(token.trim_start_matches("Bearer "))
        .expect("verify token");
    Principal::from_claims(claims).expect("principal")
}

pub fn admin(state: &AppState) -> Principal {
    principal(state, Role::Administrator, Some(ADMIN_EMAIL), None)
}

pub fn customer(state: &AppState, email: &str) -> Principal {
    principal(state, Role::Customer, Some(email), None)
}

pub fn phone_customer(state: &AppState, phone: &str) -> Principal {
    principal(state, Role::Customer, None, Some(phone))
}

pub async fn insert_package(state: &AppState, name: &str, destination: &str) -> Uuid {
    let package = PackageFields {
        package_name: name.into(),
        destination: destination.into(),
        duration: "2 nights and 3 days".into(),
        itinerary: [
            ("day_1".to_string(), format!("Arrive in {destination}")),
            ("day_2".to_string(), "Sightseeing".to_string()),
            ("day_3".to_string(), "Departure".to_string()),
        ]
        .into_iter()
        .collect(),
    };
    state
        .store
        .insert(PACKAGES, to_document_data(&package).expect("package json"))
        .await
        .expect("insert package")
}

pub fn form(email: &str, package_id: Uuid, start: &str, end: &str) -> BookingForm {
    BookingForm {
        customer_email: email.into(),
        customer_name: "Test Customer".into(),
        customer_phone: "9876543210".into(),
        package_id: package_id.to_string(),
        start_date: start.into(),
        end_date: end.into(),
        travelers: 2,
        total_amount: "₹45,000".into(),
        ..BookingForm::default()
    }
}

/// A [`MemoryStore`] whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Inserts still allowed before every further insert fails.
    inserts_left: AtomicUsize,
    limit_inserts: AtomicBool,
}

fn outage() -> StoreError {
    StoreError::Backend("connection refused".into())
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_inserts_after(&self, allowed: usize) {
        self.inserts_left.store(allowed, Ordering::SeqCst);
        self.limit_inserts.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, collection: &str, data: Value) -> Result<Uuid, StoreError> {
        self.check_writes()?;
        if self.limit_inserts.load(Ordering::SeqCst) {
            let left = self.inserts_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(outage());
            }
            self.inserts_left.store(left - 1, Ordering::SeqCst);
        }
        self.inner.insert(collection, data).await
    }

    async fn set(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        self.check_writes()?;
        self.inner.set(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        self.check_writes()?;
        self.inner.update(collection, id, data).await
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        self.check_writes()?;
        self.inner.delete(collection, id).await
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.check_reads()?;
        self.inner.get(collection, id).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_reads()?;
        self.inner.query(collection, query).await
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        self.check_reads()?;
        self.inner.count(collection).await
    }
}

/// App state over `store` with the local auth provider.
pub fn state_over(store: Arc<dyn DocumentStore>) -> AppState {
    AppState::local(test_config(), store)
}
