use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Skill level assigned to freshly added skills (matches the form slider default).
pub const DEFAULT_SKILL_LEVEL: u8 = 75;

/// The structured resume document edited by the form and read by every renderer.
///
/// Every field defaults to an empty string or sequence, so a partially filled
/// JSON payload always deserializes into a fully populated value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResumeDocument {
    pub personal: PersonalInfo,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<SkillEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<CertificationEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub position: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillEntry {
    pub name: String,
    /// Proficiency, 0–100.
    pub level: u8,
}

impl Default for SkillEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: DEFAULT_SKILL_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

/// The repeatable sections of a resume document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Certifications => "certifications",
        }
    }
}

impl ResumeDocument {
    /// The document a new session starts with: one blank entry in each of the
    /// core sections so the form has something to edit.
    pub fn starter() -> Self {
        Self {
            personal: PersonalInfo::default(),
            experience: vec![ExperienceEntry::default()],
            education: vec![EducationEntry::default()],
            skills: vec![SkillEntry::default()],
            projects: vec![ProjectEntry::default()],
            certifications: Vec::new(),
        }
    }

    /// Number of entries in a repeatable section.
    pub fn section_len(&self, section: Section) -> usize {
        match section {
            Section::Experience => self.experience.len(),
            Section::Education => self.education.len(),
            Section::Skills => self.skills.len(),
            Section::Projects => self.projects.len(),
            Section::Certifications => self.certifications.len(),
        }
    }

    /// Full display name, `None` when both halves are blank.
    pub fn full_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.personal.first_name.trim(),
            self.personal.last_name.trim()
        );
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Checks the invariants the form cannot express through types alone.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (i, skill) in self.skills.iter().enumerate() {
            if skill.level > 100 {
                return Err(StoreError::Validation(format!(
                    "skills[{i}].level must be between 0 and 100, got {}",
                    skill.level
                )));
            }
        }
        Ok(())
    }
}

/// Field-by-field editing for flat text records, keyed by the form's field names.
pub trait EditableEntry {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError>;
}

fn unknown_field(kind: &str, field: &str) -> StoreError {
    StoreError::UnknownField(format!("{kind}.{field}"))
}

impl EditableEntry for PersonalInfo {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError> {
        match field {
            "firstName" => self.first_name = value,
            "lastName" => self.last_name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "location" => self.location = value,
            "summary" => self.summary = value,
            _ => return Err(unknown_field("personal", field)),
        }
        Ok(())
    }
}

impl EditableEntry for ExperienceEntry {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError> {
        match field {
            "position" => self.position = value,
            "company" => self.company = value,
            "duration" => self.duration = value,
            "description" => self.description = value,
            _ => return Err(unknown_field("experience", field)),
        }
        Ok(())
    }
}

impl EditableEntry for EducationEntry {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError> {
        match field {
            "degree" => self.degree = value,
            "school" => self.school = value,
            "year" => self.year = value,
            _ => return Err(unknown_field("education", field)),
        }
        Ok(())
    }
}

impl EditableEntry for SkillEntry {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError> {
        match field {
            "name" => self.name = value,
            _ => return Err(unknown_field("skills", field)),
        }
        Ok(())
    }
}

impl EditableEntry for ProjectEntry {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError> {
        match field {
            "name" => self.name = value,
            "description" => self.description = value,
            _ => return Err(unknown_field("projects", field)),
        }
        Ok(())
    }
}

impl EditableEntry for CertificationEntry {
    fn set_field(&mut self, field: &str, value: String) -> Result<(), StoreError> {
        match field {
            "name" => self.name = value,
            "issuer" => self.issuer = value,
            "date" => self.date = value,
            _ => return Err(unknown_field("certifications", field)),
        }
        Ok(())
    }
}
