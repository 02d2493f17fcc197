// src/utils/html.rs

use ammonia;

use crate::models::question::CreateQuestionRequest;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe formatting tags (<b>, <code>, <p>) survive, scripts,
/// iframes and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes every free-text field of an admin-authored question.
pub fn clean_question(req: CreateQuestionRequest) -> CreateQuestionRequest {
    CreateQuestionRequest {
        topic: clean_html(req.topic.trim()),
        content: clean_html(&req.content),
        answers: req
            .answers
            .into_iter()
            .map(|mut a| {
                a.content = clean_html(&a.content);
                a
            })
            .collect(),
        explanation: req.explanation.as_deref().map(clean_html),
    }
}
