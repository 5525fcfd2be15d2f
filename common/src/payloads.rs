use std::{error::Error, fmt};

use crate::data::{CrewMember, FormSubmission, JobSite, PhotoPayload, PhotoReference};
use serde::{
    de::{DeserializeOwned, Error as _},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};

// Response payloads

/// Every endpoint answers with a flat JSON object carrying a `success` flag.
/// On success the body's fields sit next to the flag, on failure an `error`
/// message does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorablePayload<T> {
    Ok(T),
    Err(String),
}

impl<T> ErrorablePayload<T> {
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Ok(body) => Ok(body),
            Self::Err(e) => Err(e),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for ErrorablePayload<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(body) => Self::Ok(body),
            Err(e) => Self::Err(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    success: bool,
    #[serde(flatten)]
    body: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<T: Serialize> Serialize for ErrorablePayload<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Ok(body) => EnvelopeRef {
                success: true,
                body: Some(body),
                error: None,
            },
            Self::Err(e) => EnvelopeRef {
                success: false,
                body: None,
                error: Some(e),
            },
        };
        envelope.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ErrorablePayload<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let success = match fields.remove("success") {
            Some(Value::Bool(b)) => b,
            _ => return Err(D::Error::custom("response has no success flag")),
        };
        if !success {
            let error = match fields.remove("error") {
                Some(Value::String(e)) => e,
                None | Some(Value::Null) => "Unknown error".to_string(),
                Some(other) => other.to_string(),
            };
            return Ok(Self::Err(error));
        }
        T::deserialize(Value::Object(fields))
            .map(Self::Ok)
            .map_err(D::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    #[serde(default)]
    pub job_sites: Vec<JobSite>,
    #[serde(default)]
    pub crew_members: Vec<CrewMember>,
}

pub type ReferenceDataResponse = ReferenceData;

/// Where a single uploaded photo ended up.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPhoto {
    pub drive_url: String,
    pub file_id: String,
    pub file_name: String,
}

pub type UploadPhotoResponse = UploadedPhoto;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecorded {
    pub submission_id: String,
    pub timestamp: String,
    #[serde(alias = "photosUploaded")]
    pub photos_recorded: u32,
}

pub type SubmitFormResponse = SubmissionRecorded;

// Request payloads

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormRequest {
    #[serde(flatten)]
    pub form: FormSubmission,
    #[serde(default)]
    pub photo_urls: Vec<PhotoReference>,
}

/// Requests that carry an `action` discriminator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    UploadPhoto { photo: PhotoPayload },
    SubmitForm(SubmitFormRequest),
}

/// Single-call submission with the photos embedded. Carries no `action`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedSubmitRequest {
    #[serde(flatten)]
    pub form: FormSubmission,
    #[serde(default)]
    pub photos: Vec<PhotoPayload>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostRequest {
    Action(ActionRequest),
    Embedded(EmbeddedSubmitRequest),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostRequestError {
    UnknownAction(String),
    Malformed(String),
}

impl fmt::Display for PostRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction(a) => write!(f, "Unknown action: {a}"),
            Self::Malformed(s) => write!(f, "Malformed request: {s}"),
        }
    }
}

impl Error for PostRequestError {}

impl From<serde_json::Error> for PostRequestError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}

impl PostRequest {
    /// Routes a raw POST body on its `action` field. A body without one is an
    /// embedded-photo submission.
    pub fn from_slice(body: &[u8]) -> Result<Self, PostRequestError> {
        let value: Value = serde_json::from_slice(body)?;
        match value.get("action") {
            None | Some(Value::Null) => Ok(Self::Embedded(serde_json::from_value(value)?)),
            Some(Value::String(a)) if a == "uploadPhoto" || a == "submitForm" => {
                Ok(Self::Action(serde_json::from_value(value)?))
            }
            Some(Value::String(a)) => Err(PostRequestError::UnknownAction(a.clone())),
            Some(other) => Err(PostRequestError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form_json() -> Value {
        json!({
            "jobId": "J1",
            "crewMemberId": "C1",
            "tradeTaskType": "Electrical",
            "workPerformed": "Ran conduit",
            "locationOnSite": "Basement",
            "status": "Complete",
            "deviceInfo": {
                "userAgent": "ua",
                "platform": "linux/x86_64",
                "screenWidth": 390,
                "screenHeight": 844,
                "timestamp": "2024-05-01T10:00:00.000Z"
            }
        })
    }

    #[test]
    fn envelope_success() {
        let p: ErrorablePayload<UploadedPhoto> = ErrorablePayload::Ok(UploadedPhoto {
            drive_url: "http://x/photos/1".to_string(),
            file_id: "1".to_string(),
            file_name: "a.jpg".to_string(),
        });
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            json!({"success": true, "driveUrl": "http://x/photos/1", "fileId": "1", "fileName": "a.jpg"})
        );
        let back: ErrorablePayload<UploadedPhoto> = serde_json::from_value(v).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn envelope_failure() {
        let p: ErrorablePayload<SubmissionRecorded> = ErrorablePayload::Err("boom".to_string());
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, json!({"success": false, "error": "boom"}));

        let bare: ErrorablePayload<SubmissionRecorded> =
            serde_json::from_value(json!({"success": false})).unwrap();
        assert_eq!(bare, ErrorablePayload::Err("Unknown error".to_string()));
    }

    #[test]
    fn envelope_success_without_body_is_rejected() {
        let r: Result<ErrorablePayload<UploadedPhoto>, _> =
            serde_json::from_value(json!({"success": true}));
        assert!(r.is_err());
    }

    #[test]
    fn embedded_response_uses_uploaded_count() {
        let v = json!({
            "success": true,
            "submissionId": "abc",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "photosUploaded": 2
        });
        let r: ErrorablePayload<SubmissionRecorded> = serde_json::from_value(v).unwrap();
        assert_eq!(r.into_result().unwrap().photos_recorded, 2);
    }

    #[test]
    fn reference_lists_default_to_empty() {
        let r: ErrorablePayload<ReferenceData> =
            serde_json::from_value(json!({"success": true, "jobSites": []})).unwrap();
        assert_eq!(r, ErrorablePayload::Ok(ReferenceData::default()));
    }

    #[test]
    fn routes_on_action() {
        let mut submit = form_json();
        submit["action"] = json!("submitForm");
        submit["photoUrls"] = json!([{"url": "http://x/1", "name": "a.jpg"}]);
        match PostRequest::from_slice(submit.to_string().as_bytes()).unwrap() {
            PostRequest::Action(ActionRequest::SubmitForm(req)) => {
                assert_eq!(req.form.job_id, "J1");
                assert_eq!(req.photo_urls.len(), 1);
                assert_eq!(req.form.device_info.screen_width, Some(390));
            }
            other => panic!("unexpected {other:?}"),
        }

        let upload = json!({
            "action": "uploadPhoto",
            "photo": {"data": "data:image/jpeg;base64,AAAA", "name": "a.jpg", "timestamp": "t"}
        });
        assert!(matches!(
            PostRequest::from_slice(upload.to_string().as_bytes()).unwrap(),
            PostRequest::Action(ActionRequest::UploadPhoto { .. })
        ));

        let mut embedded = form_json();
        embedded["photos"] = json!([{"data": "data:image/jpeg;base64,AAAA", "name": "a.jpg", "timestamp": "t"}]);
        match PostRequest::from_slice(embedded.to_string().as_bytes()).unwrap() {
            PostRequest::Embedded(req) => assert_eq!(req.photos.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_action() {
        let body = json!({"action": "deleteEverything"}).to_string();
        let e = PostRequest::from_slice(body.as_bytes()).unwrap_err();
        assert_eq!(e.to_string(), "Unknown action: deleteEverything");
        assert!(matches!(
            PostRequest::from_slice(b"{not json"),
            Err(PostRequestError::Malformed(_))
        ));
    }

    #[test]
    fn submit_form_serializes_with_action() {
        let form: FormSubmission = serde_json::from_value(form_json()).unwrap();
        let req = ActionRequest::SubmitForm(SubmitFormRequest {
            form,
            photo_urls: vec![],
        });
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["action"], "submitForm");
        assert_eq!(v["jobId"], "J1");
        assert_eq!(v["photoUrls"], json!([]));
    }
}
