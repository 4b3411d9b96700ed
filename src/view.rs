use std::fmt;

use crate::db::StoredResume;

/// What the user can do next, derived from the stored résumé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    NoResume,
    ResumeStored { file_name: String },
    Editing { file_name: String, document_id: String },
}

impl ViewState {
    pub fn from_stored(stored: Option<&StoredResume>) -> Self {
        let Some(resume) = stored.filter(|r| !r.text.is_empty() && !r.file_name.is_empty()) else {
            return ViewState::NoResume;
        };
        match resume.document_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => ViewState::Editing {
                file_name: resume.file_name.clone(),
                document_id: id.to_string(),
            },
            None => ViewState::ResumeStored {
                file_name: resume.file_name.clone(),
            },
        }
    }

    pub fn has_resume(&self) -> bool {
        !matches!(self, ViewState::NoResume)
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::NoResume => write!(f, "No resume stored. Run `upload <PDF>` first."),
            ViewState::ResumeStored { file_name } => write!(f, "Resume stored: {}", file_name),
            ViewState::Editing { file_name, document_id } => {
                write!(f, "Editing {} (document {})", file_name, document_id)
            }
        }
    }
}
