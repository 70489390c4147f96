//! Row types for the two tables and the JSON shapes handed to the admin UI.

use serde::{Deserialize, Serialize};

use crate::constants::{DESCRIPTION_PREVIEW_CHARS, RECENT_PHOTO_PREVIEW, UPLOADS_ROUTE};

/// One row of the `submissions` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Submission {
    pub id: i64,
    pub material_type: String,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub email: String,
    pub photos: String,
    pub submission_date: String,
}

/// Values for a submission that has not been inserted yet
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub material_type: String,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub email: String,
    pub photos: String,
    pub submission_date: String,
}

/// One row of the `scrap_prices` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapPrice {
    pub id: i64,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub unit: String,
    pub last_updated: String,
}

/// Split a stored photos column into filenames, dropping blank entries
pub fn split_photos(photos: &str) -> Vec<&str> {
    photos
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Join stored filenames into the photos column representation
pub fn join_photos(names: &[String]) -> String {
    names.join(",")
}

/// Public URL of a stored photo
pub fn photo_url(stored_name: &str) -> String {
    format!("{}/{}", UPLOADS_ROUTE, stored_name)
}

impl Submission {
    pub fn photo_names(&self) -> Vec<&str> {
        split_photos(&self.photos)
    }

    pub fn photo_urls(&self) -> Vec<String> {
        self.photo_names().into_iter().map(photo_url).collect()
    }
}

/// Full submission as returned by the listing and detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionView {
    pub id: i64,
    pub material_type: String,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub email: String,
    pub photos: Vec<String>,
    /// Only present in listing results
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub photo_count: Option<usize>,
    pub submission_date: String,
}

impl SubmissionView {
    /// View used by the detail endpoint
    pub fn detail(submission: Submission) -> Self {
        let photos = submission.photo_urls();
        Self {
            id: submission.id,
            material_type: submission.material_type,
            title: submission.title,
            description: submission.description,
            quantity: submission.quantity,
            name: submission.name,
            location: submission.location,
            contact: submission.contact,
            email: submission.email,
            photos,
            photo_count: None,
            submission_date: submission.submission_date,
        }
    }

    /// View used by the paginated listing, carrying `photo_count`
    pub fn listing(submission: Submission) -> Self {
        let mut view = Self::detail(submission);
        view.photo_count = Some(view.photos.len());
        view
    }
}

/// Condensed submission shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSubmission {
    pub id: i64,
    pub material_type: String,
    pub title: String,
    pub description: String,
    pub name: String,
    pub location: String,
    pub photos: Vec<String>,
    pub submission_date: String,
}

impl From<Submission> for RecentSubmission {
    fn from(submission: Submission) -> Self {
        let photos = submission
            .photo_urls()
            .into_iter()
            .take(RECENT_PHOTO_PREVIEW)
            .collect();
        Self {
            id: submission.id,
            material_type: submission.material_type,
            title: submission.title,
            description: truncate_description(&submission.description),
            name: submission.name,
            location: submission.location,
            photos,
            submission_date: submission.submission_date,
        }
    }
}

/// Cut a description to the dashboard preview length, marking the cut with `...`
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let head: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}
