//! Records persisted by the stores and the request payloads that build them.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::images::{to_project_image_path, ProjectId};
use crate::store::{Record, RecordId};

/// Local wall-clock time, serialized like `2024-05-01T18:22:09.123456`.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub replied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_date: Option<NaiveDateTime>,
}

impl Record for Message {
    const KIND: &'static str = "Message";

    fn id(&self) -> RecordId {
        self.id
    }
}

/// Body of `POST /api/contact`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl ContactSubmission {
    /// Checks required fields in form order and reports the first one missing.
    pub fn validate(&self) -> Result<(), &'static str> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        match fields
            .iter()
            .find(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        {
            Some((field, _)) => Err(*field),
            None => Ok(()),
        }
    }

    pub fn into_message(self, id: RecordId) -> Message {
        Message {
            id,
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            subject: self.subject.unwrap_or_default(),
            message: self.message.unwrap_or_default(),
            date: now(),
            read: false,
            replied: false,
            replied_date: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Live,
    #[default]
    Draft,
}

impl ProjectStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "live" => Some(Self::Live),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Draft => f.write_str("draft"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StatusValues {
    #[serde(default)]
    pub stability: i64,
    #[serde(default)]
    pub range: i64,
    #[serde(default)]
    pub reliability: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub mission_brief: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub linked_in_link: String,
    #[serde(default)]
    pub report_file: String,
    #[serde(default)]
    pub status_values: StatusValues,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Record for Project {
    const KIND: &'static str = "Project";

    fn id(&self) -> RecordId {
        self.id
    }
}

/// Body of `POST /api/projects` and `PUT /api/projects/{id}`. Every field is
/// optional; on update only the supplied ones change.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: Option<String>,
    pub mission: Option<String>,
    pub mission_brief: Option<String>,
    pub architecture: Option<String>,
    pub stack: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "present_images")]
    pub images: Option<Vec<String>>,
    pub linked_in_link: Option<String>,
    pub report_file: Option<String>,
    pub stability: Option<i64>,
    pub range: Option<i64>,
    pub reliability: Option<i64>,
}

impl ProjectPayload {
    pub fn into_project(self, id: ProjectId) -> Project {
        let created = now();
        Project {
            id,
            images: project_images(self.images.as_deref().unwrap_or_default(), id),
            name: self.name.unwrap_or_default(),
            mission: self.mission.unwrap_or_default(),
            mission_brief: self.mission_brief.unwrap_or_default(),
            architecture: self.architecture.unwrap_or_default(),
            stack: self.stack.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            linked_in_link: self.linked_in_link.unwrap_or_default(),
            report_file: self.report_file.unwrap_or_default(),
            status_values: StatusValues {
                stability: self.stability.unwrap_or_default(),
                range: self.range.unwrap_or_default(),
                reliability: self.reliability.unwrap_or_default(),
            },
            created_at: created,
            updated_at: created,
        }
    }

    pub fn apply_to(&self, project: &mut Project) {
        if let Some(images) = &self.images {
            project.images = project_images(images, project.id);
        }

        merge(&mut project.name, &self.name);
        merge(&mut project.mission, &self.mission);
        merge(&mut project.mission_brief, &self.mission_brief);
        merge(&mut project.architecture, &self.architecture);
        merge(&mut project.stack, &self.stack);
        merge(&mut project.status, &self.status);
        merge(&mut project.linked_in_link, &self.linked_in_link);
        merge(&mut project.report_file, &self.report_file);
        merge(&mut project.status_values.stability, &self.stability);
        merge(&mut project.status_values.range, &self.range);
        merge(&mut project.status_values.reliability, &self.reliability);
        project.updated_at = now();
    }
}

/// A present `images` key replaces the list; `null` clears it.
fn present_images<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(|images| Some(images.unwrap_or_default()))
}

/// Re-roots every image into the folder of `project_id`, dropping empty entries.
pub fn project_images(images: &[String], project_id: ProjectId) -> Vec<String> {
    images
        .iter()
        .filter_map(|image| to_project_image_path(image, project_id))
        .collect()
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Skill {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub percentage: i64,
}

impl Record for Skill {
    const KIND: &'static str = "Skill";

    fn id(&self) -> RecordId {
        self.id
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SkillPayload {
    pub name: Option<String>,
    pub percentage: Option<i64>,
}

impl SkillPayload {
    pub fn into_skill(self, id: RecordId) -> Skill {
        Skill {
            id,
            name: self.name.unwrap_or_default(),
            percentage: self.percentage.unwrap_or_default(),
        }
    }

    pub fn apply_to(&self, skill: &mut Skill) {
        merge(&mut skill.name, &self.name);
        merge(&mut skill.percentage, &self.percentage);
    }
}

/// Skills written to a fresh `skills.json`.
pub fn default_skills() -> Vec<Skill> {
    [
        ("Electronics Design", 90),
        ("Robotics & Automation", 85),
        ("Embedded Systems", 88),
        ("Microcontroller Programming", 87),
        ("Circuit Design", 92),
        ("Space Technology", 80),
    ]
    .into_iter()
    .zip(1..)
    .map(|((name, percentage), id)| Skill {
        id,
        name: name.to_string(),
        percentage,
    })
    .collect()
}

fn merge<T: Clone>(target: &mut T, update: &Option<T>) {
    if let Some(value) = update {
        *target = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_validation_reports_first_missing_field() {
        let submission = ContactSubmission {
            name: Some("Ada".into()),
            email: Some(String::new()),
            subject: None,
            message: Some("hi".into()),
        };
        assert_eq!(submission.validate(), Err("email"));
        assert_eq!(ContactSubmission::default().validate(), Err("name"));
    }

    #[test]
    fn test_message_serializes_camel_case_without_empty_reply_date() {
        let submission = ContactSubmission {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            subject: Some("Robots".into()),
            message: Some("Hello".into()),
        };
        assert_eq!(submission.validate(), Ok(()));

        let value = serde_json::to_value(submission.into_message(3)).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["read"], false);
        assert!(value.get("repliedDate").is_none());
    }

    #[test]
    fn test_project_payload_normalizes_images_into_project_folder() {
        let payload: ProjectPayload = serde_json::from_value(json!({
            "name": "Rover",
            "images": ["C:\\pics\\rover.jpg", "", "https://cdn.example.com/r.png"],
            "stability": 70,
            "linkedInLink": "https://linkedin.com/post/1"
        }))
        .unwrap();

        let project = payload.into_project(4);
        assert_eq!(
            project.images,
            vec![
                "image/project/pro4/rover.jpg".to_string(),
                "https://cdn.example.com/r.png".to_string()
            ]
        );
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.status_values.stability, 70);
        assert_eq!(project.status_values.range, 0);
        assert_eq!(project.linked_in_link, "https://linkedin.com/post/1");
    }

    #[test]
    fn test_project_update_only_touches_supplied_fields() {
        let mut project = ProjectPayload {
            name: Some("Rover".into()),
            mission: Some("Explore".into()),
            images: Some(vec!["a.png".into()]),
            range: Some(12),
            ..Default::default()
        }
        .into_project(2);

        ProjectPayload {
            status: Some(ProjectStatus::Live),
            reliability: Some(99),
            ..Default::default()
        }
        .apply_to(&mut project);

        assert_eq!(project.name, "Rover");
        assert_eq!(project.mission, "Explore");
        assert_eq!(project.images, vec!["image/project/pro2/a.png".to_string()]);
        assert_eq!(project.status, ProjectStatus::Live);
        assert_eq!(project.status_values.range, 12);
        assert_eq!(project.status_values.reliability, 99);
    }

    #[test]
    fn test_null_images_clear_the_list() {
        let mut project = ProjectPayload {
            images: Some(vec!["a.png".into()]),
            ..Default::default()
        }
        .into_project(3);

        let untouched: ProjectPayload = serde_json::from_value(json!({ "name": "Rover" })).unwrap();
        untouched.apply_to(&mut project);
        assert_eq!(project.images, vec!["image/project/pro3/a.png".to_string()]);

        let cleared: ProjectPayload = serde_json::from_value(json!({ "images": null })).unwrap();
        cleared.apply_to(&mut project);
        assert!(project.images.is_empty());
    }

    #[test]
    fn test_project_serializes_with_frontend_keys() {
        let project = ProjectPayload::default().into_project(1);
        let value = serde_json::to_value(&project).unwrap();
        for key in [
            "missionBrief",
            "linkedInLink",
            "reportFile",
            "statusValues",
            "createdAt",
            "updatedAt",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["status"], "draft");
    }

    #[test]
    fn test_default_skills_have_sequential_ids() {
        let skills = default_skills();
        assert_eq!(skills.len(), 6);
        assert_eq!(skills[0].id, 1);
        assert_eq!(skills[5].name, "Space Technology");
        assert_eq!(skills[4].percentage, 92);
    }

    #[test]
    fn test_project_status_parse() {
        assert_eq!(ProjectStatus::parse("live"), Some(ProjectStatus::Live));
        assert_eq!(ProjectStatus::parse("draft"), Some(ProjectStatus::Draft));
        assert_eq!(ProjectStatus::parse("archived"), None);
        assert_eq!(ProjectStatus::Live.to_string(), "live");
    }
}
