//! Listing submission: multipart form in, one `submissions` row plus photo files out.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Local;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::SUBMISSION_DATE_FORMAT;
use crate::db::{DynError, Store};
use crate::error::AppError;
use crate::models::{join_photos, NewSubmission};
use crate::queries::submissions;
use crate::serve::AppState;
use crate::uploads::UploadStore;

/// Required form fields, in the order they are reported when missing
pub const REQUIRED_FIELDS: [&str; 8] = [
    "materialType",
    "listingTitle",
    "listingDescription",
    "listingQuantity",
    "sellerName",
    "listingLocation",
    "listingContact",
    "sellerEmail",
];

/// Repeatable multipart field carrying photos
pub const FILE_FIELD: &str = "fileInput";

const SUBMIT_FAILED: &str = "Failed to submit listing. Error";

/// A file part of the submitted form, held in memory until validation passes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Everything read from the multipart body
#[derive(Debug, Default)]
pub struct ListingForm {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl ListingForm {
    pub fn new(fields: HashMap<String, String>, files: Vec<UploadedFile>) -> Self {
        Self { fields, files }
    }

    /// Read all parts; text fields are trimmed, unknown fields ignored
    pub async fn read(mut multipart: Multipart) -> Result<Self, DynError> {
        let mut form = ListingForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                form.files.push(UploadedFile { file_name, data });
            } else if REQUIRED_FIELDS.contains(&name.as_str()) {
                let value = field.text().await?;
                form.fields.insert(name, value.trim().to_string());
            }
        }
        Ok(form)
    }

    fn value(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// Names of required fields that are absent or blank, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.value(field).trim().is_empty())
            .collect()
    }

    fn to_submission(&self, photos: &[String], submission_date: String) -> NewSubmission {
        NewSubmission {
            material_type: self.value("materialType").to_string(),
            title: self.value("listingTitle").to_string(),
            description: self.value("listingDescription").to_string(),
            quantity: self.value("listingQuantity").to_string(),
            name: self.value("sellerName").to_string(),
            location: self.value("listingLocation").to_string(),
            contact: self.value("listingContact").to_string(),
            email: self.value("sellerEmail").to_string(),
            photos: join_photos(photos),
            submission_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub photos_uploaded: usize,
    pub submission_id: i64,
}

/// Outcome of a stored listing
#[derive(Debug)]
pub struct SubmittedListing {
    pub id: i64,
    pub photos: Vec<String>,
}

/// Write every acceptable photo, skipping blank names, disallowed extensions
/// and files that fail to write
pub async fn save_photos(uploads: &UploadStore, files: &[UploadedFile]) -> Vec<String> {
    let mut saved = Vec::new();
    for file in files {
        if file.file_name.trim().is_empty() {
            continue;
        }
        if !uploads.is_allowed(&file.file_name) {
            warn!("Skipping upload with disallowed extension: {}", file.file_name);
            continue;
        }
        match uploads.save(&file.file_name, &file.data).await {
            Ok(stored_name) => {
                info!("Saved upload {} as {}", file.file_name, stored_name);
                saved.push(stored_name);
            }
            Err(e) => {
                error!("Failed to save upload {}: {}", file.file_name, e);
            }
        }
    }
    saved
}

/// Save photos and insert the row; photos are removed again if the insert fails
pub async fn store_listing(
    store: &Store,
    uploads: &UploadStore,
    form: &ListingForm,
) -> Result<SubmittedListing, DynError> {
    let photos = save_photos(uploads, &form.files).await;
    let submission_date = Local::now().format(SUBMISSION_DATE_FORMAT).to_string();
    let new_submission = form.to_submission(&photos, submission_date);

    match store
        .fetch_scalar::<i64, _>(&submissions::insert(&new_submission))
        .await
    {
        Ok(id) => Ok(SubmittedListing { id, photos }),
        Err(e) => {
            for name in &photos {
                if let Err(remove_err) = uploads.remove(name).await {
                    warn!("Failed to remove orphaned upload {}: {}", name, remove_err);
                }
            }
            Err(e)
        }
    }
}

fn success_message(photos_uploaded: usize) -> String {
    if photos_uploaded > 0 {
        format!(
            "Listing submitted successfully! {} photo(s) uploaded.",
            photos_uploaded
        )
    } else {
        "Listing submitted successfully! No photos uploaded.".to_string()
    }
}

pub async fn submit_listing_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = match multipart {
        Ok(multipart) => ListingForm::read(multipart)
            .await
            .map_err(AppError::failed(SUBMIT_FAILED))?,
        Err(rejection) => {
            warn!("Submission body is not multipart: {}", rejection);
            ListingForm::default()
        }
    };

    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let listing = store_listing(&state.store, &state.uploads, &form)
        .await
        .map_err(AppError::failed(SUBMIT_FAILED))?;

    info!(
        "Stored submission {} with {} photo(s)",
        listing.id,
        listing.photos.len()
    );
    Ok(Json(SubmitResponse {
        success: true,
        message: success_message(listing.photos.len()),
        photos_uploaded: listing.photos.len(),
        submission_id: listing.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ALLOWED_EXTENSIONS;
    use crate::db::create_test_connection_in_temporary_file;

    fn complete_fields() -> HashMap<String, String> {
        REQUIRED_FIELDS
            .iter()
            .map(|field| (field.to_string(), format!("{} value", field)))
            .collect()
    }

    #[test]
    fn test_missing_fields_in_form_order() {
        let mut fields = complete_fields();
        fields.insert("sellerEmail".to_string(), "   ".to_string());
        fields.remove("listingTitle");

        let form = ListingForm::new(fields, Vec::new());
        assert_eq!(form.missing_fields(), vec!["listingTitle", "sellerEmail"]);
    }

    #[test]
    fn test_success_message() {
        assert_eq!(
            success_message(0),
            "Listing submitted successfully! No photos uploaded."
        );
        assert_eq!(
            success_message(2),
            "Listing submitted successfully! 2 photo(s) uploaded."
        );
    }

    #[tokio::test]
    async fn test_save_photos_skips_blank_and_disallowed() {
        let dir = tempfile::tempdir().unwrap();
        let allowed: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        let uploads = UploadStore::new(dir.path(), &allowed);

        let files = vec![
            UploadedFile {
                file_name: "".to_string(),
                data: Bytes::from_static(b""),
            },
            UploadedFile {
                file_name: "virus.exe".to_string(),
                data: Bytes::from_static(b"MZ"),
            },
            UploadedFile {
                file_name: "scrap.JPG".to_string(),
                data: Bytes::from_static(b"jpeg"),
            },
        ];

        let saved = save_photos(&uploads, &files).await;
        assert_eq!(saved.len(), 1);
        assert!(saved[0].ends_with("_scrap.JPG"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_form_misses_every_field() {
        assert_eq!(ListingForm::default().missing_fields(), REQUIRED_FIELDS.to_vec());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_saved_photos() {
        // No init_schema, so the insert hits a missing table
        let (store, _db_guard) = create_test_connection_in_temporary_file().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let allowed: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        let uploads = UploadStore::new(dir.path(), &allowed);

        let files = vec![
            UploadedFile {
                file_name: "front.png".to_string(),
                data: Bytes::from_static(b"png"),
            },
            UploadedFile {
                file_name: "back.jpg".to_string(),
                data: Bytes::from_static(b"jpg"),
            },
        ];
        let form = ListingForm::new(complete_fields(), files);

        assert!(store_listing(&store, &uploads, &form).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
