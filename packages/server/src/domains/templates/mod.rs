//! Templates domain - email bodies and their follow-up sequences

pub mod models;

pub use models::{
    NewTemplate, Template, TemplatePatch, TemplatePreview, TemplateSequence, TemplateSummary,
};
