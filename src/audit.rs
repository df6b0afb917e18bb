use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    store::{AUDIT_LOGS, DocumentStore},
};

pub async fn log_audit(
    store: &dyn DocumentStore,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    store
        .insert(
            AUDIT_LOGS,
            json!({
                "userId": user_id,
                "action": action,
                "resource": resource,
                "metadata": metadata,
                "createdAt": Utc::now(),
            }),
        )
        .await?;

    Ok(())
}

/// Records an audit entry; a failed write is logged and otherwise ignored.
pub async fn record(
    store: &dyn DocumentStore,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    if let Err(err) = log_audit(store, user_id, action, resource, metadata).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
