#![allow(dead_code)]

//! In-memory session state: the resume being edited and the selected template.
//!
//! The shell owns the store and mutates it through `&mut self`. Exports work on
//! a `Snapshot`, which shares the document through an `Arc`; later edits go
//! through `Arc::make_mut` and never disturb a snapshot already handed out.

use std::sync::Arc;

use crate::errors::StoreError;
use crate::models::resume::{
    CertificationEntry, EditableEntry, EducationEntry, ExperienceEntry, ProjectEntry,
    ResumeDocument, Section, SkillEntry,
};
use crate::templates::TemplateId;

/// An immutable view handed to renderers and export strategies.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Arc<ResumeDocument>,
    pub template: TemplateId,
}

#[derive(Debug, Clone)]
pub struct ResumeStore {
    document: Arc<ResumeDocument>,
    template: TemplateId,
}

impl Default for ResumeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumeStore {
    /// A fresh session with the starter document and the first template.
    pub fn new() -> Self {
        Self {
            document: Arc::new(ResumeDocument::starter()),
            template: TemplateId::default(),
        }
    }

    pub fn document(&self) -> &ResumeDocument {
        &self.document
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Replaces the whole document after validating it. Last write wins.
    pub fn update_document(&mut self, document: ResumeDocument) -> Result<(), StoreError> {
        document.validate()?;
        self.document = Arc::new(document);
        Ok(())
    }

    pub fn select_template(&mut self, id: TemplateId) {
        if self.template != id {
            tracing::debug!(from = %self.template, to = %id, "Template selected");
        }
        self.template = id;
    }

    pub fn set_personal_field(&mut self, field: &str, value: impl Into<String>) -> Result<(), StoreError> {
        self.doc_mut().personal.set_field(field, value.into())
    }

    /// Sets one text field of one entry, using the form's field names.
    pub fn set_entry_field(
        &mut self,
        section: Section,
        index: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.check_index(section, index)?;
        let value = value.into();
        let doc = self.doc_mut();
        match section {
            Section::Experience => doc.experience[index].set_field(field, value),
            Section::Education => doc.education[index].set_field(field, value),
            Section::Skills => doc.skills[index].set_field(field, value),
            Section::Projects => doc.projects[index].set_field(field, value),
            Section::Certifications => doc.certifications[index].set_field(field, value),
        }
    }

    pub fn set_skill_level(&mut self, index: usize, level: u8) -> Result<(), StoreError> {
        if level > 100 {
            return Err(StoreError::Validation(format!(
                "skills[{index}].level must be between 0 and 100, got {level}"
            )));
        }
        self.check_index(Section::Skills, index)?;
        self.doc_mut().skills[index].level = level;
        Ok(())
    }

    /// Replaces a project's technologies from the comma-separated form input.
    pub fn set_technologies(&mut self, index: usize, raw: &str) -> Result<(), StoreError> {
        self.check_index(Section::Projects, index)?;
        let technologies = if raw.trim().is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(|t| t.trim().to_string()).collect()
        };
        self.doc_mut().projects[index].technologies = technologies;
        Ok(())
    }

    /// Appends a blank entry and returns its index.
    pub fn add_entry(&mut self, section: Section) -> usize {
        let doc = self.doc_mut();
        match section {
            Section::Experience => doc.experience.push(ExperienceEntry::default()),
            Section::Education => doc.education.push(EducationEntry::default()),
            Section::Skills => doc.skills.push(SkillEntry::default()),
            Section::Projects => doc.projects.push(ProjectEntry::default()),
            Section::Certifications => doc.certifications.push(CertificationEntry::default()),
        }
        doc.section_len(section) - 1
    }

    pub fn remove_entry(&mut self, section: Section, index: usize) -> Result<(), StoreError> {
        self.check_index(section, index)?;
        let doc = self.doc_mut();
        match section {
            Section::Experience => {
                doc.experience.remove(index);
            }
            Section::Education => {
                doc.education.remove(index);
            }
            Section::Skills => {
                doc.skills.remove(index);
            }
            Section::Projects => {
                doc.projects.remove(index);
            }
            Section::Certifications => {
                doc.certifications.remove(index);
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: Arc::clone(&self.document),
            template: self.template,
        }
    }

    fn doc_mut(&mut self) -> &mut ResumeDocument {
        Arc::make_mut(&mut self.document)
    }

    fn check_index(&self, section: Section, index: usize) -> Result<(), StoreError> {
        let len = self.document.section_len(section);
        if index >= len {
            return Err(StoreError::IndexOutOfRange {
                section: section.as_str(),
                index,
                len,
            });
        }
        Ok(())
    }
}
