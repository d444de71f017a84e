pub mod job;
pub mod resume;

pub use job::{JobContext, Seniority};
pub use resume::{
    Additional, CustomItem, CustomSection, EducationEntry, PersonalInfo, ProjectEntry,
    ResumeDocument, WorkEntry,
};
