use serde::Deserialize;

use crate::application::services::Answer;
use crate::domain::value_objects::AnswerId;

/// Request to start a battle on a topic
#[derive(Debug, Deserialize)]
pub struct StartBattleRequestDto {
    pub topic_id: String,
}

/// An answer is either the id of a chosen option or a correctness flag
/// graded by the host
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum AnswerRequestDto {
    Choice { answer_id: AnswerId },
    Graded { correct: bool },
}

impl From<AnswerRequestDto> for Answer {
    fn from(value: AnswerRequestDto) -> Self {
        match value {
            AnswerRequestDto::Choice { answer_id } => Answer::Choice(answer_id),
            AnswerRequestDto::Graded { correct } => Answer::Graded(correct),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_request_shapes() {
        let id = AnswerId::new();
        let choice: AnswerRequestDto =
            serde_json::from_str(&format!(r#"{{"answer_id":"{id}"}}"#)).unwrap();
        assert_eq!(Answer::from(choice), Answer::Choice(id));

        let graded: AnswerRequestDto = serde_json::from_str(r#"{"correct":false}"#).unwrap();
        assert_eq!(Answer::from(graded), Answer::Graded(false));

        assert!(serde_json::from_str::<AnswerRequestDto>(r#"{"answer":1}"#).is_err());
    }
}
