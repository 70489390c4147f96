//! Admin dashboard endpoints: listing with search, statistics, detail and delete.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{DEFAULT_PAGE_LIMIT, RECENT_SUBMISSIONS};
use crate::db::{DynError, Store};
use crate::error::AppError;
use crate::models::{split_photos, RecentSubmission, Submission, SubmissionView};
use crate::queries::submissions::{self, SubmissionFilter};
use crate::serve::AppState;

/// Raw query string of the listing endpoint
///
/// Kept as strings so an unparsable limit/offset falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub material: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListParams {
    pub fn limit(&self) -> u64 {
        parse_or(self.limit.as_deref(), DEFAULT_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        parse_or(self.offset.as_deref(), 0)
    }

    pub fn filter(&self) -> SubmissionFilter {
        SubmissionFilter::new(self.search.as_deref(), self.material.as_deref())
    }
}

fn parse_or(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionPage {
    pub success: bool,
    pub submissions: Vec<SubmissionView>,
    pub total: i64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_submissions: i64,
    pub material_types: i64,
    pub total_images: usize,
    pub today_submissions: i64,
    pub avg_photos: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
    pub recent_submissions: Vec<RecentSubmission>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub submission: SubmissionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Filtered, paginated listing ordered newest first
pub async fn list_submissions(
    store: &Store,
    filter: &SubmissionFilter,
    limit: u64,
    offset: u64,
) -> Result<(Vec<Submission>, i64), DynError> {
    let total: i64 = store
        .fetch_scalar(&submissions::count_matching(filter))
        .await?;
    let rows: Vec<Submission> = store
        .fetch_all(&submissions::select_page(filter, limit, offset))
        .await?;
    Ok((rows, total))
}

/// images / submissions rounded to one decimal, 0.0 without submissions
pub fn average_photos(total_images: usize, total_submissions: i64) -> f64 {
    let divisor = total_submissions.max(1) as f64;
    (total_images as f64 / divisor * 10.0).round() / 10.0
}

/// Aggregate counters shown on the dashboard
pub async fn dashboard_stats(store: &Store) -> Result<DashboardStats, DynError> {
    let total_submissions: i64 = store
        .fetch_scalar(&submissions::count_matching(&SubmissionFilter::default()))
        .await?;
    let material_types: i64 = store
        .fetch_scalar(&submissions::count_material_types())
        .await?;
    let photo_columns: Vec<String> = store
        .fetch_column(&submissions::select_nonempty_photos())
        .await?;
    let total_images = photo_columns
        .iter()
        .map(|photos| split_photos(photos).len())
        .sum();
    let today = Local::now().format("%Y-%m-%d").to_string();
    let today_submissions: i64 = store
        .fetch_scalar(&submissions::count_submitted_on(&today))
        .await?;

    Ok(DashboardStats {
        total_submissions,
        material_types,
        total_images,
        today_submissions,
        avg_photos: average_photos(total_images, total_submissions),
    })
}

/// Most recent submissions in their dashboard form
pub async fn recent_submissions(store: &Store) -> Result<Vec<RecentSubmission>, DynError> {
    let rows: Vec<Submission> = store
        .fetch_all(&submissions::select_recent(RECENT_SUBMISSIONS))
        .await?;
    Ok(rows.into_iter().map(RecentSubmission::from).collect())
}

pub async fn find_submission(store: &Store, id: i64) -> Result<Option<Submission>, DynError> {
    store.fetch_optional(&submissions::select_by_id(id)).await
}

pub async fn list_submissions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<SubmissionPage>, AppError> {
    let limit = params.limit();
    let offset = params.offset();
    let (rows, total) = list_submissions(&state.store, &params.filter(), limit, offset)
        .await
        .map_err(AppError::failed("Error fetching submissions"))?;

    let has_more = offset.saturating_add(limit) < u64::try_from(total).unwrap_or(0);
    Ok(Json(SubmissionPage {
        success: true,
        submissions: rows.into_iter().map(SubmissionView::listing).collect(),
        total,
        limit,
        offset,
        has_more,
    }))
}

pub async fn dashboard_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, AppError> {
    let stats = dashboard_stats(&state.store)
        .await
        .map_err(AppError::failed("Error fetching dashboard stats"))?;
    let recent = recent_submissions(&state.store)
        .await
        .map_err(AppError::failed("Error fetching dashboard stats"))?;

    Ok(Json(DashboardResponse {
        success: true,
        stats,
        recent_submissions: recent,
    }))
}

pub async fn get_submission_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = find_submission(&state.store, id)
        .await
        .map_err(AppError::failed("Error fetching submission"))?
        .ok_or(AppError::SubmissionNotFound(id))?;

    Ok(Json(SubmissionResponse {
        success: true,
        submission: SubmissionView::detail(submission),
    }))
}

pub async fn delete_submission_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let submission = find_submission(&state.store, id)
        .await
        .map_err(AppError::failed("Error deleting submission"))?
        .ok_or(AppError::SubmissionNotFound(id))?;

    for name in submission.photo_names() {
        if let Err(e) = state.uploads.remove(name).await {
            warn!("Error deleting file {}: {}", name, e);
        }
    }

    state
        .store
        .execute(&submissions::delete_by_id(id))
        .await
        .map_err(AppError::failed("Error deleting submission"))?;

    info!("Deleted submission {} ({})", id, submission.title);
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Submission \"{}\" deleted successfully", submission.title),
    }))
}
