use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    catalog::package_templates,
    error::{AppError, AppResult},
    models::{Package, to_document_data},
    store::{Direction, DocumentQuery, DocumentStore, PACKAGES},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SeedReport {
    /// Packages present before seeding.
    pub existing: u64,
    pub inserted: usize,
}

/// Inserts the catalog one package at a time.
///
/// With packages already present nothing is written unless `confirmed`;
/// confirming adds the catalog again. A failure part-way leaves the earlier
/// inserts in place.
pub async fn seed_packages(store: &dyn DocumentStore, confirmed: bool) -> AppResult<SeedReport> {
    let existing = store.count(PACKAGES).await?;
    if existing > 0 && !confirmed {
        return Err(AppError::ConfirmationRequired(
            "Packages already exist. Add anyway?".into(),
        ));
    }

    let templates = package_templates();
    let total = templates.len();
    let mut inserted = 0;
    for package in &templates {
        let result = match to_document_data(package) {
            Ok(data) => store.insert(PACKAGES, data).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::error!(error = %err, inserted, total, "package upload stopped");
            return Err(AppError::Unavailable(format!(
                "Failed to upload packages ({inserted} of {total} added). Please try again."
            )));
        }
        inserted += 1;
    }

    tracing::info!(inserted, existing, "package templates uploaded");
    Ok(SeedReport { existing, inserted })
}

/// All packages ordered by name. Read failures degrade to an empty list.
pub async fn list_packages(store: &dyn DocumentStore) -> Vec<Package> {
    let query = DocumentQuery::all().order_by("package_name", Direction::Asc);
    match store.query(PACKAGES, &query).await {
        Ok(docs) => docs
            .into_iter()
            .filter_map(|doc| Package::try_from(doc).ok())
            .collect(),
        Err(err) => {
            tracing::error!(error = %err, "failed to load packages");
            Vec::new()
        }
    }
}
