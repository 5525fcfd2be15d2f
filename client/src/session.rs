use std::path::PathBuf;

use crate::{
    compress::{CompressedPhoto, ImageCompressor},
    error::{Error, Result},
    form::{device_snapshot, FormField, FormFields},
    orchestrator::{Orchestrator, Progress, SubmissionReceipt},
    remote::RemoteEndpoint,
    staging::{PhotoStaging, MAX_PHOTOS},
};

/// Everything a crew member has entered for the report in progress: field
/// values and staged photos. Owned by whoever drives the form.
pub struct FormSession {
    pub fields: FormFields,
    photos: PhotoStaging,
    compressor: ImageCompressor,
    user_agent: String,
}

impl FormSession {
    pub fn new(compressor: ImageCompressor, user_agent: impl Into<String>) -> Self {
        Self {
            fields: FormFields::default(),
            photos: PhotoStaging::new(),
            compressor,
            user_agent: user_agent.into(),
        }
    }

    pub fn photos(&self) -> &PhotoStaging {
        &self.photos
    }

    /// Compresses and stages a selection of files, in order. A selection that
    /// would take the total past [`MAX_PHOTOS`] is rejected whole. A file that
    /// fails to compress stops the batch; earlier files of the batch stay
    /// staged.
    pub async fn select_photos(&mut self, paths: &[PathBuf]) -> Result<usize> {
        if self.photos.len() + paths.len() > MAX_PHOTOS {
            return Err(Error::TooManyPhotos {
                staged: self.photos.len(),
                selected: paths.len(),
                max: MAX_PHOTOS,
            });
        }
        for path in paths {
            let photo = self.compressor.compress_file(path).await.map_err(|e| {
                log::error!("Error processing photos: {e}");
                e
            })?;
            self.photos.add(photo);
        }
        Ok(paths.len())
    }

    pub fn remove_photo(&mut self, index: usize) -> Result<CompressedPhoto> {
        self.photos.remove_at(index)
    }

    pub fn dictate(&mut self, field: FormField, transcript: &str) {
        self.fields.append_transcript(field, transcript);
    }

    /// Submits the report. Only a successful submission clears the staged
    /// photos and resets the fields; a failed one leaves both for a retry.
    pub async fn submit<E: RemoteEndpoint + ?Sized>(
        &mut self,
        orchestrator: &Orchestrator<'_, E>,
        progress: &dyn Progress,
    ) -> Result<SubmissionReceipt> {
        let receipt = orchestrator
            .submit(
                &self.fields,
                self.photos.list(),
                device_snapshot(&self.user_agent),
                progress,
            )
            .await?;
        self.fields.reset();
        self.photos.clear();
        Ok(receipt)
    }
}
