use chrono::{SecondsFormat, Utc};
use common::data::{DeviceInfo, FormSubmission};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    JobId,
    CrewMemberId,
    TradeTaskType,
    WorkPerformed,
    LocationOnSite,
    Status,
    IssuesConcerns,
    MaterialsUsed,
    MaterialsNeeded,
    WeatherConditions,
}

impl FormField {
    pub const REQUIRED: [FormField; 6] = [
        FormField::JobId,
        FormField::CrewMemberId,
        FormField::TradeTaskType,
        FormField::WorkPerformed,
        FormField::LocationOnSite,
        FormField::Status,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::JobId => "Job site",
            FormField::CrewMemberId => "Crew member",
            FormField::TradeTaskType => "Trade/task type",
            FormField::WorkPerformed => "Work performed",
            FormField::LocationOnSite => "Location on site",
            FormField::Status => "Status",
            FormField::IssuesConcerns => "Issues/concerns",
            FormField::MaterialsUsed => "Materials used",
            FormField::MaterialsNeeded => "Materials needed",
            FormField::WeatherConditions => "Weather conditions",
        }
    }
}

/// Current values of the report form. Blank optional fields are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    pub job_id: String,
    pub crew_member_id: String,
    pub trade_task_type: String,
    pub work_performed: String,
    pub location_on_site: String,
    pub status: String,
    pub issues_concerns: String,
    pub materials_used: String,
    pub materials_needed: String,
    pub weather_conditions: String,
}

fn optional(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl FormFields {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::JobId => &self.job_id,
            FormField::CrewMemberId => &self.crew_member_id,
            FormField::TradeTaskType => &self.trade_task_type,
            FormField::WorkPerformed => &self.work_performed,
            FormField::LocationOnSite => &self.location_on_site,
            FormField::Status => &self.status,
            FormField::IssuesConcerns => &self.issues_concerns,
            FormField::MaterialsUsed => &self.materials_used,
            FormField::MaterialsNeeded => &self.materials_needed,
            FormField::WeatherConditions => &self.weather_conditions,
        }
    }

    pub fn get_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::JobId => &mut self.job_id,
            FormField::CrewMemberId => &mut self.crew_member_id,
            FormField::TradeTaskType => &mut self.trade_task_type,
            FormField::WorkPerformed => &mut self.work_performed,
            FormField::LocationOnSite => &mut self.location_on_site,
            FormField::Status => &mut self.status,
            FormField::IssuesConcerns => &mut self.issues_concerns,
            FormField::MaterialsUsed => &mut self.materials_used,
            FormField::MaterialsNeeded => &mut self.materials_needed,
            FormField::WeatherConditions => &mut self.weather_conditions,
        }
    }

    /// Fails on the first blank required field.
    pub fn validate(&self) -> Result<()> {
        match FormField::REQUIRED
            .into_iter()
            .find(|f| self.get(*f).trim().is_empty())
        {
            Some(field) => Err(Error::Validation(field.label())),
            None => Ok(()),
        }
    }

    /// Appends dictated text to a field, separated by a space from whatever
    /// is already there.
    pub fn append_transcript(&mut self, field: FormField, transcript: &str) {
        let value = self.get_mut(field);
        let current = value.trim();
        *value = if current.is_empty() {
            transcript.to_string()
        } else {
            format!("{current} {transcript}")
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_submission(&self, device_info: DeviceInfo) -> FormSubmission {
        FormSubmission {
            job_id: self.job_id.clone(),
            crew_member_id: self.crew_member_id.clone(),
            trade_task_type: self.trade_task_type.clone(),
            work_performed: self.work_performed.clone(),
            location_on_site: self.location_on_site.clone(),
            status: self.status.clone(),
            issues_concerns: optional(&self.issues_concerns),
            materials_used: optional(&self.materials_used),
            materials_needed: optional(&self.materials_needed),
            weather_conditions: optional(&self.weather_conditions),
            device_info,
        }
    }
}

/// Diagnostic info about this device, taken at submission time.
pub fn device_snapshot(user_agent: &str) -> DeviceInfo {
    DeviceInfo {
        user_agent: user_agent.to_string(),
        platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        screen_width: None,
        screen_height: None,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn filled() -> FormFields {
        FormFields {
            job_id: "JS-1".to_string(),
            crew_member_id: "CM-7".to_string(),
            trade_task_type: "Drywall".to_string(),
            work_performed: "Hung sheets on east wall".to_string(),
            location_on_site: "Unit 4B".to_string(),
            status: "In Progress".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn validation_names_first_missing_field() {
        assert!(filled().validate().is_ok());

        let mut fields = filled();
        fields.work_performed = "   ".to_string();
        fields.status.clear();
        match fields.validate() {
            Err(Error::Validation(label)) => assert_eq!(label, "Work performed"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            FormFields::default().validate(),
            Err(Error::Validation("Job site"))
        ));
    }

    #[test]
    fn transcript_appends_with_space() {
        let mut fields = FormFields::default();
        fields.append_transcript(FormField::IssuesConcerns, "water on floor");
        assert_eq!(fields.issues_concerns, "water on floor");
        fields.issues_concerns.push_str("  ");
        fields.append_transcript(FormField::IssuesConcerns, "near stairwell");
        assert_eq!(fields.issues_concerns, "water on floor near stairwell");
    }

    #[test]
    fn blank_optional_fields_are_omitted() {
        let mut fields = filled();
        fields.materials_used = "nails\npaint".to_string();
        fields.weather_conditions = "  ".to_string();
        let submission = fields.to_submission(device_snapshot("test"));
        assert_eq!(submission.materials_used.as_deref(), Some("nails\npaint"));
        assert_eq!(submission.weather_conditions, None);
        assert_eq!(submission.issues_concerns, None);
        assert_eq!(submission.device_info.user_agent, "test");
    }

    #[test]
    fn reset_clears_everything() {
        let mut fields = filled();
        fields.reset();
        assert_eq!(fields, FormFields::default());
    }
}
