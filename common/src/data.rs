use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JobSite {
    pub id: String,
    pub name: String,
    pub address: String,
}

impl fmt::Display for JobSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.address)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CrewMember {
    pub id: String,
    pub name: String,
}

impl fmt::Display for CrewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A compressed photo as it travels over the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PhotoPayload {
    /** `data:image/jpeg;base64,...` */
    pub data: String,
    pub name: String,
    /** ISO-8601 time the photo was compressed on the device */
    pub timestamp: String,
}

/// A photo that has already been persisted remotely.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PhotoReference {
    pub url: String,
    #[serde(default)]
    pub name: String,
}

/// Diagnostic snapshot of the submitting device, stored verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub platform: String,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub timestamp: String,
}

/// The report fields shared by both submission shapes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub job_id: String,
    pub crew_member_id: String,
    pub trade_task_type: String,
    pub work_performed: String,
    pub location_on_site: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_concerns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials_needed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_conditions: Option<String>,
    pub device_info: DeviceInfo,
}

#[cfg(test)]
mod tests {
    use super::{DeviceInfo, FormSubmission, JobSite};

    fn device() -> DeviceInfo {
        DeviceInfo {
            user_agent: "test/1.0".to_string(),
            platform: "linux/x86_64".to_string(),
            screen_width: None,
            screen_height: None,
            timestamp: "2024-05-01T10:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn submission_field_names() {
        let s = FormSubmission {
            job_id: "J1".to_string(),
            crew_member_id: "C1".to_string(),
            trade_task_type: "Framing".to_string(),
            work_performed: "Walls".to_string(),
            location_on_site: "Level 2".to_string(),
            status: "In Progress".to_string(),
            issues_concerns: None,
            materials_used: Some("nails".to_string()),
            materials_needed: None,
            weather_conditions: None,
            device_info: device(),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["jobId"], "J1");
        assert_eq!(v["crewMemberId"], "C1");
        assert_eq!(v["tradeTaskType"], "Framing");
        assert_eq!(v["locationOnSite"], "Level 2");
        assert_eq!(v["materialsUsed"], "nails");
        assert!(v.get("issuesConcerns").is_none());
        assert_eq!(v["deviceInfo"]["userAgent"], "test/1.0");
        assert!(v["deviceInfo"]["screenWidth"].is_null());
    }

    #[test]
    fn job_site_label() {
        let site = JobSite {
            id: "1".to_string(),
            name: "Riverside".to_string(),
            address: "12 Main St".to_string(),
        };
        assert_eq!(site.to_string(), "Riverside - 12 Main St");
    }
}
