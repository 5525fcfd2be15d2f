//! What the endpoint does with each request: read the reference sheets,
//! store photos and append submission rows.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use common::{
    data::{CrewMember, FormSubmission, JobSite, PhotoPayload, PhotoReference},
    parse_materials_list,
    payloads::*,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    files::{PhotoError, PhotoStore},
    sheets::{cell_text, sheet, Row, SheetError, Workbook},
};

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Request(#[from] PostRequestError),
}

/// Whatever a POST produced.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum PostResponse {
    Uploaded(UploadPhotoResponse),
    Recorded(SubmitFormResponse),
}

fn iso(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `jobsite_<yyyyMMdd_HHmmss>_<8 chars>.jpg`, timed by the photo's own
/// timestamp when it parses.
pub fn upload_file_name(photo_timestamp: &str, random_id: &str, now: DateTime<Utc>) -> String {
    let taken = DateTime::parse_from_rfc3339(photo_timestamp)
        .map(|t| t.with_timezone(&Local))
        .unwrap_or_else(|_| now.with_timezone(&Local));
    let tail = &random_id[random_id.len().saturating_sub(8)..];
    format!("jobsite_{}_{tail}.jpg", taken.format(FILE_TIME_FORMAT))
}

/// `jobsite_<8 chars of the submission id>_<yyyyMMdd_HHmmss>_<n>.jpg`, `n`
/// counting from one. The id chars come from its random tail.
pub fn embedded_file_name(submission_id: &str, index: usize, now: DateTime<Utc>) -> String {
    let short_id = &submission_id[submission_id.len().saturating_sub(8)..];
    format!(
        "jobsite_{short_id}_{}_{}.jpg",
        now.with_timezone(&Local).format(FILE_TIME_FORMAT),
        index + 1
    )
}

pub struct Endpoint {
    sheets: Workbook,
    photos: PhotoStore,
}

impl Endpoint {
    pub fn new(sheets: Workbook, photos: PhotoStore) -> Self {
        Self { sheets, photos }
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    pub async fn reference_data(&self) -> Result<ReferenceDataResponse, EndpointError> {
        let job_sites = self
            .sheets
            .data_rows(sheet::JOB_SITES)
            .await?
            .iter()
            .map(|row| JobSite {
                id: cell_text(row.first()),
                name: cell_text(row.get(1)),
                address: cell_text(row.get(2)),
            })
            .collect();
        let crew_members = self
            .sheets
            .data_rows(sheet::CREW_MEMBERS)
            .await?
            .iter()
            .map(|row| CrewMember {
                id: cell_text(row.first()),
                name: cell_text(row.get(1)),
            })
            .collect();
        Ok(ReferenceData {
            job_sites,
            crew_members,
        })
    }

    /// Routes a raw POST body.
    pub async fn handle_post(&self, body: &[u8]) -> Result<PostResponse, EndpointError> {
        match PostRequest::from_slice(body)? {
            PostRequest::Action(ActionRequest::UploadPhoto { photo }) => {
                Ok(PostResponse::Uploaded(self.upload_photo(&photo).await?))
            }
            PostRequest::Action(ActionRequest::SubmitForm(request)) => {
                Ok(PostResponse::Recorded(self.submit_form(&request).await?))
            }
            PostRequest::Embedded(request) => {
                Ok(PostResponse::Recorded(self.submit_embedded(&request).await?))
            }
        }
    }

    pub async fn upload_photo(
        &self,
        photo: &PhotoPayload,
    ) -> Result<UploadPhotoResponse, EndpointError> {
        log::debug!("photo upload {}: {} chars", photo.name, photo.data.len());
        let file_name = upload_file_name(&photo.timestamp, &uuidv7::create(), Utc::now());
        let stored = self.photos.save(file_name, &photo.data).await?;
        Ok(UploadedPhoto {
            drive_url: stored.url,
            file_id: stored.file_id,
            file_name: stored.file_name,
        })
    }

    /// Metadata submission of the two-phase flow; photos arrive as links.
    pub async fn submit_form(
        &self,
        request: &SubmitFormRequest,
    ) -> Result<SubmitFormResponse, EndpointError> {
        let (submission_id, submitted_at) = self.record_submission(&request.form).await?;

        if !request.photo_urls.is_empty() {
            let now = iso(&Utc::now());
            let rows = request
                .photo_urls
                .iter()
                .enumerate()
                .map(|(index, PhotoReference { url, name })| {
                    let caption = if name.is_empty() {
                        format!("Photo {}", index + 1)
                    } else {
                        name.clone()
                    };
                    vec![
                        json!(uuidv7::create()),
                        json!(submission_id),
                        json!(url),
                        json!(caption),
                        json!(now),
                    ]
                })
                .collect();
            self.sheets.append_rows(sheet::PHOTOS, rows).await?;
        }

        Ok(SubmissionRecorded {
            submission_id,
            timestamp: iso(&submitted_at),
            photos_recorded: request.photo_urls.len() as u32,
        })
    }

    /// Single-call submission. A photo that cannot be stored is skipped and
    /// only lowers the recorded count.
    pub async fn submit_embedded(
        &self,
        request: &EmbeddedSubmitRequest,
    ) -> Result<SubmitFormResponse, EndpointError> {
        let (submission_id, submitted_at) = self.record_submission(&request.form).await?;

        let mut recorded = 0;
        for (index, photo) in request.photos.iter().enumerate() {
            match self.store_embedded(&submission_id, index, photo).await {
                Ok(()) => recorded += 1,
                Err(e) => log::warn!("Error uploading photo {index}: {e}"),
            }
        }

        Ok(SubmissionRecorded {
            submission_id,
            timestamp: iso(&submitted_at),
            photos_recorded: recorded,
        })
    }

    async fn store_embedded(
        &self,
        submission_id: &str,
        index: usize,
        photo: &PhotoPayload,
    ) -> Result<(), EndpointError> {
        let file_name = embedded_file_name(submission_id, index, Utc::now());
        let stored = self.photos.save(file_name, &photo.data).await?;
        self.sheets
            .append_row(
                sheet::PHOTOS,
                vec![
                    json!(uuidv7::create()),
                    json!(submission_id),
                    json!(stored.url),
                    json!(photo.name),
                    json!(iso(&Utc::now())),
                ],
            )
            .await?;
        Ok(())
    }

    /// Appends the submission row and its materials.
    async fn record_submission(
        &self,
        form: &FormSubmission,
    ) -> Result<(String, DateTime<Utc>), EndpointError> {
        let submission_id = uuidv7::create();
        let submitted_at = Utc::now();
        let optional = |v: &Option<String>| json!(v.as_deref().unwrap_or(""));
        let device_info = serde_json::to_string(&form.device_info).unwrap_or_default();

        self.sheets
            .append_row(
                sheet::FORM_SUBMISSIONS,
                vec![
                    json!(submission_id),
                    json!(form.job_id),
                    json!(form.crew_member_id),
                    json!(iso(&submitted_at)),
                    json!(form.trade_task_type),
                    json!(form.work_performed),
                    json!(form.location_on_site),
                    json!(form.status),
                    optional(&form.issues_concerns),
                    optional(&form.weather_conditions),
                    Value::String(device_info),
                ],
            )
            .await?;

        for (name, text) in [
            (sheet::MATERIALS_USED, &form.materials_used),
            (sheet::MATERIALS_NEEDED, &form.materials_needed),
        ] {
            let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) else {
                continue;
            };
            let rows: Vec<Row> = parse_materials_list(text)
                .into_iter()
                .map(|m| vec![json!(uuidv7::create()), json!(submission_id), json!(m)])
                .collect();
            self.sheets.append_rows(name, rows).await?;
        }

        log::info!(
            "recorded submission {submission_id} for job {} by {}",
            form.job_id,
            form.crew_member_id
        );
        Ok((submission_id, submitted_at))
    }
}
