//! Question entity - Opaque quiz input supplied per topic

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AnswerId, QuestionId, TopicId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
    pub is_correct: bool,
}

#[cfg(test)]
impl AnswerOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: AnswerId::new(),
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub topic_id: TopicId,
    pub text: String,
    /// Options in presentation order
    pub answers: Vec<AnswerOption>,
}

impl Question {
    #[cfg(test)]
    pub fn new(topic_id: TopicId, text: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(),
            topic_id,
            text: text.into(),
            answers: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_answer(mut self, answer: AnswerOption) -> Self {
        self.answers.push(answer);
        self
    }

    /// Whether `answer_id` is a correct option, or `None` if it is not an option
    pub fn grade(&self, answer_id: AnswerId) -> Option<bool> {
        self.answers
            .iter()
            .find(|a| a.id == answer_id)
            .map(|a| a.is_correct)
    }
}
