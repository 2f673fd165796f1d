//! Record model for the CV collections.
//!
//! One struct per collection, serde-mapped to the wire shapes used by the
//! TypeScript data files (camelCase keys, kebab-case enum values). Each
//! collection keeps one canonical schema: the union of the legacy and newer
//! optional fields observed in the data files. Unknown fields are rejected so
//! schema drift fails loudly instead of being dropped on re-encode.
//!
//! Records have no identity field; their position in the collection is their
//! only identity.

use crate::error::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record type belonging to one named collection.
///
/// Ties the struct to its on-disk form: the logical collection name, the
/// exported variable and TypeScript type name, and the wording used when
/// synthesizing commit messages.
pub trait CvRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Logical collection name, e.g. "publications".
    const COLLECTION: &'static str;

    /// Name bound by the exported declaration, e.g. "publications".
    const VARIABLE: &'static str;

    /// TypeScript element type name, e.g. "Publication".
    const TYPE_NAME: &'static str;

    /// Singular noun for commit messages, e.g. "publication".
    const NOUN: &'static str;

    /// Short human-readable identification of the record (title/name),
    /// used in commit messages.
    fn summary(&self) -> String;

    /// Presence checks on required fields. Runs before any network call.
    fn validate(&self) -> Result<()>;

    /// Repository-relative path of the backing file. Deterministic
    /// function of the collection name.
    fn file_path() -> String {
        format!("data/{}.ts", Self::COLLECTION)
    }
}

fn require(noun: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::Validation(format!(
            "{} is missing required field '{}'",
            noun, field
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────
// Publications
// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublicationKind {
    Journal,
    Conference,
    BookChapter,
    Book,
    Proceedings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Publication {
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "type")]
    pub kind: PublicationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CvRecord for Publication {
    const COLLECTION: &'static str = "publications";
    const VARIABLE: &'static str = "publications";
    const TYPE_NAME: &'static str = "Publication";
    const NOUN: &'static str = "publication";

    fn summary(&self) -> String {
        self.title.clone()
    }

    fn validate(&self) -> Result<()> {
        require(Self::NOUN, "title", &self.title)?;
        require(Self::NOUN, "authors", &self.authors)?;
        require(Self::NOUN, "journal", &self.journal)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────
// Awards
// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwardCategory {
    Awards,
    Services,
    Honors,
    Fellowships,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Award {
    pub title: String,
    pub organization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AwardCategory>,
    /// Free-form type description, e.g. "Best Paper Award".
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
}

impl CvRecord for Award {
    const COLLECTION: &'static str = "awards";
    const VARIABLE: &'static str = "awards";
    const TYPE_NAME: &'static str = "Award";
    const NOUN: &'static str = "award";

    fn summary(&self) -> String {
        self.title.clone()
    }

    fn validate(&self) -> Result<()> {
        require(Self::NOUN, "title", &self.title)?;
        require(Self::NOUN, "organization", &self.organization)?;
        require(Self::NOUN, "date", &self.date)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────
// Presentations
// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationKind {
    Keynote,
    Invited,
    EventOrganiser,
    OralPresenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    International,
    National,
    Regional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Presentation {
    pub title: String,
    pub event: String,
    pub location: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub kind: PresentationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides_url: Option<String>,
}

impl CvRecord for Presentation {
    const COLLECTION: &'static str = "presentations";
    const VARIABLE: &'static str = "presentations";
    const TYPE_NAME: &'static str = "Presentation";
    const NOUN: &'static str = "presentation";

    fn summary(&self) -> String {
        self.title.clone()
    }

    fn validate(&self) -> Result<()> {
        require(Self::NOUN, "title", &self.title)?;
        require(Self::NOUN, "event", &self.event)?;
        require(Self::NOUN, "location", &self.location)?;
        require(Self::NOUN, "date", &self.date)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────
// Research projects
// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectRole {
    ProjectLeader,
    CoInvestigator,
    Researcher,
    Consultant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResearchProject {
    pub title: String,
    pub description: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_agency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ProjectRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl CvRecord for ResearchProject {
    const COLLECTION: &'static str = "research-projects";
    const VARIABLE: &'static str = "researchProjects";
    const TYPE_NAME: &'static str = "ResearchProject";
    const NOUN: &'static str = "research project";

    fn summary(&self) -> String {
        self.title.clone()
    }

    fn validate(&self) -> Result<()> {
        require(Self::NOUN, "title", &self.title)?;
        require(Self::NOUN, "description", &self.description)?;
        require(Self::NOUN, "startDate", &self.start_date)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────
// Supervision
// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupervisionLevel {
    Phd,
    Masters,
    MastersByResearch,
    Undergraduate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupervisionRole {
    MainSupervisor,
    CoSupervisor,
    Advisor,
    Examiner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Supervision {
    pub student_name: String,
    pub level: SupervisionLevel,
    pub topic: String,
    pub year: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<SupervisionRole>,
}

impl CvRecord for Supervision {
    const COLLECTION: &'static str = "supervision";
    const VARIABLE: &'static str = "supervision";
    const TYPE_NAME: &'static str = "Supervision";
    const NOUN: &'static str = "supervision entry";

    fn summary(&self) -> String {
        self.student_name.clone()
    }

    fn validate(&self) -> Result<()> {
        require(Self::NOUN, "studentName", &self.student_name)?;
        require(Self::NOUN, "topic", &self.topic)?;
        require(Self::NOUN, "year", &self.year)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────
// Evaluation / service
// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationCategory {
    JournalEditorial,
    ThesisEvaluation,
    AcademicPromotion,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Evaluation {
    pub position: String,
    pub organization: String,
    pub period: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EvaluationCategory>,
    /// Free-form type description, e.g. "Article in Journal".
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl CvRecord for Evaluation {
    const COLLECTION: &'static str = "evaluation";
    const VARIABLE: &'static str = "evaluation";
    const TYPE_NAME: &'static str = "Evaluation";
    const NOUN: &'static str = "evaluation entry";

    fn summary(&self) -> String {
        format!("{} ({})", self.position, self.organization)
    }

    fn validate(&self) -> Result<()> {
        require(Self::NOUN, "position", &self.position)?;
        require(Self::NOUN, "organization", &self.organization)?;
        require(Self::NOUN, "period", &self.period)?;
        require(Self::NOUN, "description", &self.description)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_publication() -> Publication {
        Publication {
            title: "On Optimistic Sync".to_string(),
            authors: "A. Author, B. Author".to_string(),
            journal: "Journal of Examples".to_string(),
            year: 2023,
            doi: Some("10.1000/xyz".to_string()),
            kind: PublicationKind::Journal,
            pdf_url: None,
            image_url: None,
        }
    }

    #[test]
    fn test_publication_wire_shape() {
        let json = serde_json::to_value(sample_publication()).unwrap();
        assert_eq!(json["type"], "journal");
        assert_eq!(json["year"], 2023);
        // Absent optionals are omitted entirely
        assert!(json.get("pdfUrl").is_none());
        assert!(json.get("imageUrl").is_none());
        assert_eq!(json["doi"], "10.1000/xyz");
    }

    #[test]
    fn test_kebab_case_enum_values() {
        let sup = Supervision {
            student_name: "C. Student".to_string(),
            level: SupervisionLevel::MastersByResearch,
            topic: "Parsers".to_string(),
            year: "2024".to_string(),
            status: ProjectStatus::Ongoing,
            role: Some(SupervisionRole::MainSupervisor),
        };
        let json = serde_json::to_value(&sup).unwrap();
        assert_eq!(json["level"], "masters-by-research");
        assert_eq!(json["role"], "main-supervisor");
        assert_eq!(json["status"], "ongoing");
        assert_eq!(json["studentName"], "C. Student");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let raw = r#"{
            "title": "T", "organization": "O", "date": "2020",
            "legacyField": true
        }"#;
        let result: std::result::Result<Award, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_presence() {
        let mut publication = sample_publication();
        assert!(publication.validate().is_ok());

        publication.journal = "  ".to_string();
        let err = publication.validate().unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(err.to_string().contains("journal"));
    }

    #[test]
    fn test_file_path_is_deterministic() {
        assert_eq!(Publication::file_path(), "data/publications.ts");
        assert_eq!(ResearchProject::file_path(), "data/research-projects.ts");
        assert_eq!(Evaluation::file_path(), "data/evaluation.ts");
    }

    #[test]
    fn test_summary_for_commit_messages() {
        assert_eq!(sample_publication().summary(), "On Optimistic Sync");

        let eval = Evaluation {
            position: "Editor".to_string(),
            organization: "Some Journal".to_string(),
            period: "2020-2022".to_string(),
            description: "Editorial board".to_string(),
            category: Some(EvaluationCategory::JournalEditorial),
            type_label: None,
            start_date: None,
            end_date: None,
        };
        assert_eq!(eval.summary(), "Editor (Some Journal)");
    }
}
