pub mod answer_client;
pub mod notifier;
pub mod page_quiz;
pub mod quiz_ui;

pub use answer_client::{AnswerService, HttpAnswerClient};
pub use notifier::{Notifier, PageNotifier, Severity, TracingNotifier};
pub use page_quiz::{PageExtractor, PageQuizUi};
pub use quiz_ui::QuizUi;
