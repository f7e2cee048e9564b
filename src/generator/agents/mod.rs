pub mod drafting_writer;
pub mod literature_scout;
pub mod methodology_designer;
pub mod polish_editor;
pub mod topic_refiner;

pub use drafting_writer::{DraftOutcome, DraftRejection, DraftSource, DraftingInput, DraftingWriter};
pub use literature_scout::{LiteratureInput, LiteratureScout};
pub use methodology_designer::{
    MethodologyDesigner, MethodologyInput, PREFERENCE_QUESTIONS, preference_key,
};
pub use polish_editor::{PolishAudit, PolishEditor, PolishInput, PolishOutcome};
pub use topic_refiner::{TopicInput, TopicRefiner};
