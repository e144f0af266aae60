//! Data models module
//!
//! Content payloads exchanged with the backend and the quiz data types
//! driven by the quiz engine.

pub mod content;
pub mod quiz;

// Re-export commonly used types
pub use content::{
    ContentItem,
    FileContent,
    ItemDetail,
    ItemKey,
    ItemOrder,
    UploadResponse,
    UploadedFile,
};
pub use quiz::{
    Answer,
    Difficulty,
    GeneratedQuestion,
    GeneratedQuiz,
    QuestionType,
    Question,
    QuizMeta,
    Score,
};
