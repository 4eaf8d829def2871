pub mod answer;
pub mod confidence;
pub mod highlight;
pub mod mode;
pub mod question;
pub mod store;

pub use answer::{AnswerPayload, ModelAnswer, QuestionPayload};
pub use confidence::{Confidence, ConfidenceTier};
pub use highlight::{HighlightKind, HighlightStyle};
pub use mode::{DispatchStrategy, Mode};
pub use question::{letter_index, QuestionRecord, Status};
pub use store::{QuestionStore, SharedStore};
