//! One submission attempt, start to finish.
//!
//! Photos reach the endpoint in one of two ways. With
//! [`PhotoTransport::UploadThenReference`] each staged photo is uploaded on
//! its own, in staging order, and the report then carries only the returned
//! links; the first failed upload ends the attempt and nothing is recorded.
//! With [`PhotoTransport::EmbedDirectly`] the photos ride inside the single
//! submission call and the endpoint skips any photo it cannot store, so the
//! recorded count may come back lower than the number sent.
//!
//! Nothing is retried. Photos uploaded before an aborted two-phase attempt
//! stay in storage unreferenced.

use std::fmt;

use common::{
    data::{DeviceInfo, PhotoReference},
    payloads::{EmbeddedSubmitRequest, SubmissionRecorded, SubmitFormRequest},
};

use crate::{
    compress::CompressedPhoto,
    error::Result,
    form::FormFields,
    remote::RemoteEndpoint,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PhotoTransport {
    #[default]
    UploadThenReference,
    EmbedDirectly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// `index` is zero-based.
    UploadingPhoto { index: usize, total: usize },
    SubmittingMetadata,
    Submitting,
    Succeeded { photos_recorded: u32 },
    Failed { message: String },
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UploadingPhoto { index, total } => {
                write!(f, "Uploading photo {} of {total}...", index + 1)
            }
            Self::SubmittingMetadata => write!(f, "Saving form data..."),
            Self::Submitting => write!(f, "Submitting report..."),
            Self::Succeeded { photos_recorded: 0 } => write!(f, "✓ Report submitted successfully!"),
            Self::Succeeded { photos_recorded } => write!(
                f,
                "✓ Report submitted successfully with {photos_recorded} photo(s)!"
            ),
            Self::Failed { message } => write!(f, "✗ Error: {message}"),
        }
    }
}

impl SubmissionPhase {
    /// Whether the attempt is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// Receives every phase transition of a submission.
pub trait Progress: Send + Sync {
    fn phase(&self, phase: &SubmissionPhase);
}

/// Discards progress.
pub struct Quiet;

impl Progress for Quiet {
    fn phase(&self, _phase: &SubmissionPhase) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub submission_id: String,
    pub timestamp: String,
    pub recorded_photo_count: u32,
}

impl From<SubmissionRecorded> for SubmissionReceipt {
    fn from(value: SubmissionRecorded) -> Self {
        Self {
            submission_id: value.submission_id,
            timestamp: value.timestamp,
            recorded_photo_count: value.photos_recorded,
        }
    }
}

pub struct Orchestrator<'a, E: RemoteEndpoint + ?Sized> {
    endpoint: &'a E,
    transport: PhotoTransport,
}

impl<'a, E: RemoteEndpoint + ?Sized> Orchestrator<'a, E> {
    pub fn new(endpoint: &'a E, transport: PhotoTransport) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    pub fn transport(&self) -> PhotoTransport {
        self.transport
    }

    /// Runs one attempt. Fields are validated before anything is sent.
    pub async fn submit(
        &self,
        fields: &FormFields,
        photos: &[CompressedPhoto],
        device_info: DeviceInfo,
        progress: &dyn Progress,
    ) -> Result<SubmissionReceipt> {
        fields.validate()?;
        let result = match self.transport {
            PhotoTransport::UploadThenReference => {
                self.upload_then_reference(fields, photos, device_info, progress)
                    .await
            }
            PhotoTransport::EmbedDirectly => {
                self.embed_directly(fields, photos, device_info, progress)
                    .await
            }
        };
        match &result {
            Ok(receipt) => {
                log::info!(
                    "submission {} recorded with {} photo(s)",
                    receipt.submission_id,
                    receipt.recorded_photo_count
                );
                progress.phase(&SubmissionPhase::Succeeded {
                    photos_recorded: receipt.recorded_photo_count,
                });
            }
            Err(e) => {
                log::error!("Form submission error: {e}");
                progress.phase(&SubmissionPhase::Failed {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    async fn upload_then_reference(
        &self,
        fields: &FormFields,
        photos: &[CompressedPhoto],
        device_info: DeviceInfo,
        progress: &dyn Progress,
    ) -> Result<SubmissionReceipt> {
        let mut photo_urls = Vec::with_capacity(photos.len());
        for (index, photo) in photos.iter().enumerate() {
            progress.phase(&SubmissionPhase::UploadingPhoto {
                index,
                total: photos.len(),
            });
            let uploaded = self.endpoint.upload_photo(&photo.to_payload()).await?;
            log::debug!("photo {} stored as {}", photo.name(), uploaded.file_id);
            photo_urls.push(PhotoReference {
                url: uploaded.drive_url,
                name: uploaded.file_name,
            });
        }
        debug_assert!(photo_urls.len() <= photos.len());

        progress.phase(&SubmissionPhase::SubmittingMetadata);
        let request = SubmitFormRequest {
            form: fields.to_submission(device_info),
            photo_urls,
        };
        Ok(self.endpoint.submit_form(&request).await?.into())
    }

    async fn embed_directly(
        &self,
        fields: &FormFields,
        photos: &[CompressedPhoto],
        device_info: DeviceInfo,
        progress: &dyn Progress,
    ) -> Result<SubmissionReceipt> {
        progress.phase(&SubmissionPhase::Submitting);
        let request = EmbeddedSubmitRequest {
            form: fields.to_submission(device_info),
            photos: photos.iter().map(CompressedPhoto::to_payload).collect(),
        };
        Ok(self.endpoint.submit_embedded(&request).await?.into())
    }
}
