use std::{fmt, time::Duration};

use async_trait::async_trait;
use common::{data::PhotoPayload, payloads::*};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// The spreadsheet-backed endpoint that holds reference data and records
/// submissions.
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    async fn reference_data(&self) -> Result<ReferenceData>;

    /// Stores one photo and returns its link. Two-phase transport only.
    async fn upload_photo(&self, photo: &PhotoPayload) -> Result<UploadedPhoto>;

    async fn submit_form(&self, request: &SubmitFormRequest) -> Result<SubmissionRecorded>;

    /// Records a submission with its photos in one call.
    async fn submit_embedded(&self, request: &EmbeddedSubmitRequest)
        -> Result<SubmissionRecorded>;
}

pub struct HttpEndpoint {
    client: Client,
    url: Url,
}

impl HttpEndpoint {
    pub fn new(url: Url, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Processes a response from the endpoint.
    /// This involves checking the status code, decoding the body and
    /// unwrapping the success envelope.
    async fn process_response<Resp: DeserializeOwned + fmt::Debug>(
        input: reqwest::Result<reqwest::Response>,
    ) -> Result<Resp> {
        let res = input?;
        let status = res.status();
        if !status.is_success() {
            log::debug!("error body: {:?}", res.text().await);
            return Err(Error::BadStatus(status.as_u16()));
        }
        let text = res.text().await?;
        let response: ErrorablePayload<Resp> = serde_json::from_str(&text)?;
        response.into_result().map_err(Error::RemoteFailure)
    }

    async fn get<Resp: DeserializeOwned + fmt::Debug>(&self) -> Result<Resp> {
        let res = self.client.get(self.url.clone()).send().await;
        Self::process_response(res).await
    }

    async fn post<Req: Serialize + ?Sized, Resp: DeserializeOwned + fmt::Debug>(
        &self,
        payload: &Req,
    ) -> Result<Resp> {
        let res = self.client.post(self.url.clone()).json(payload).send().await;
        Self::process_response(res).await
    }
}

#[async_trait]
impl RemoteEndpoint for HttpEndpoint {
    async fn reference_data(&self) -> Result<ReferenceData> {
        self.get().await
    }

    async fn upload_photo(&self, photo: &PhotoPayload) -> Result<UploadedPhoto> {
        let request = ActionRequest::UploadPhoto {
            photo: photo.clone(),
        };
        self.post(&request).await
    }

    async fn submit_form(&self, request: &SubmitFormRequest) -> Result<SubmissionRecorded> {
        // The action tag lives on the enum, so wrap a copy of the body.
        let request = ActionRequest::SubmitForm(request.clone());
        self.post(&request).await
    }

    async fn submit_embedded(
        &self,
        request: &EmbeddedSubmitRequest,
    ) -> Result<SubmissionRecorded> {
        self.post(request).await
    }
}
