//! Battle Session - The state machine of one topic attempt
//!
//! A session lives only in memory. Every correct answer takes one life from
//! the enemy (who has one life per question), every incorrect answer takes one
//! from the player. Whoever reaches zero first decides the battle. Nothing is
//! persisted from here; the caller reacts to the terminal transition.

use serde::Serialize;

use crate::domain::entities::Question;
use crate::domain::errors::EngineError;
use crate::domain::value_objects::{AnswerId, BattleId, CharacterId, QuestionId, TopicId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleState {
    InProgress,
    Won,
    Lost,
}

impl BattleState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// What a single answer did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerResolution {
    pub correct: bool,
    pub state: BattleState,
    /// Index of the next question, when the answer moved the session forward
    pub advanced_to: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BattleSession {
    id: BattleId,
    user_id: UserId,
    character_id: CharacterId,
    topic_id: TopicId,
    questions: Vec<Question>,
    current_question_index: usize,
    enemy_life: u32,
    player_life: u32,
    total_life: u32,
    correct_answers: u32,
    error_count: u32,
    state: BattleState,
}

impl BattleSession {
    /// Start a battle over `questions`.
    ///
    /// The enemy gets one life per question. `total_life` is floored at one so
    /// a session can never start already lost.
    pub fn new(
        user_id: UserId,
        character_id: CharacterId,
        topic_id: TopicId,
        questions: Vec<Question>,
        total_life: u32,
    ) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::EmptyEncounter { topic_id });
        }

        let total_life = total_life.max(1);
        Ok(Self {
            id: BattleId::new(),
            user_id,
            character_id,
            topic_id,
            enemy_life: questions.len() as u32,
            questions,
            current_question_index: 0,
            player_life: total_life,
            total_life,
            correct_answers: 0,
            error_count: 0,
            state: BattleState::InProgress,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    #[cfg(test)]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_question_index]
    }

    #[cfg(test)]
    pub fn enemy_life(&self) -> u32 {
        self.enemy_life
    }

    #[cfg(test)]
    pub fn player_life(&self) -> u32 {
        self.player_life
    }

    #[cfg(test)]
    pub fn total_life(&self) -> u32 {
        self.total_life
    }

    #[cfg(test)]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Resolve one answer.
    ///
    /// Life totals and counters update immediately. The question index only
    /// moves while the battle is still running and there is a later question;
    /// on the last question the player keeps answering it until someone falls.
    pub fn submit_answer(&mut self, is_correct: bool) -> Result<AnswerResolution, EngineError> {
        if self.state.is_terminal() {
            return Err(EngineError::SessionTerminal);
        }

        if is_correct {
            self.correct_answers += 1;
            self.enemy_life = self.enemy_life.saturating_sub(1);
            if self.enemy_life == 0 {
                self.state = BattleState::Won;
            }
        } else {
            self.error_count += 1;
            self.player_life = self.player_life.saturating_sub(1);
            if self.player_life == 0 {
                self.state = BattleState::Lost;
            }
        }

        let mut advanced_to = None;
        if !self.state.is_terminal() && self.current_question_index + 1 < self.questions.len() {
            self.current_question_index += 1;
            advanced_to = Some(self.current_question_index);
        }

        Ok(AnswerResolution {
            correct: is_correct,
            state: self.state,
            advanced_to,
        })
    }

    /// Resolve an answer given as one of the current question's options
    pub fn submit_choice(&mut self, answer_id: AnswerId) -> Result<AnswerResolution, EngineError> {
        if self.state.is_terminal() {
            return Err(EngineError::SessionTerminal);
        }
        let is_correct = self
            .current_question()
            .grade(answer_id)
            .ok_or(EngineError::UnknownAnswer)?;
        self.submit_answer(is_correct)
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let question = self.current_question();
        BattleSnapshot {
            battle_id: self.id,
            topic_id: self.topic_id,
            state: self.state,
            question_index: self.current_question_index,
            question_count: self.questions.len(),
            enemy_life: self.enemy_life,
            player_life: self.player_life,
            total_life: self.total_life,
            correct_answers: self.correct_answers,
            error_count: self.error_count,
            question: QuestionView {
                id: question.id,
                text: question.text.clone(),
                options: question
                    .answers
                    .iter()
                    .map(|a| OptionView {
                        id: a.id,
                        text: a.text.clone(),
                    })
                    .collect(),
            },
        }
    }
}

/// Read-only view of a session for the host; correctness is never exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleSnapshot {
    pub battle_id: BattleId,
    pub topic_id: TopicId,
    pub state: BattleState,
    pub question_index: usize,
    pub question_count: usize,
    pub enemy_life: u32,
    pub player_life: u32,
    pub total_life: u32,
    pub correct_answers: u32,
    pub error_count: u32,
    pub question: QuestionView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: AnswerId,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AnswerOption;

    fn questions(topic_id: TopicId, count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| {
                Question::new(topic_id, format!("Question {}", i))
                    .with_answer(AnswerOption::new("right", true))
                    .with_answer(AnswerOption::new("wrong", false))
            })
            .collect()
    }

    fn session(question_count: usize, total_life: u32) -> BattleSession {
        let topic_id = TopicId::new();
        BattleSession::new(
            UserId::new(),
            CharacterId::new(),
            topic_id,
            questions(topic_id, question_count),
            total_life,
        )
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let battle = session(4, 3);
        assert_eq!(battle.state(), BattleState::InProgress);
        assert_eq!(battle.enemy_life(), 4);
        assert_eq!(battle.player_life(), 3);
        assert_eq!(battle.current_question_index(), 0);
        assert_eq!(battle.correct_answers(), 0);
        assert_eq!(battle.error_count(), 0);
    }

    #[test]
    fn test_empty_encounter_is_rejected() {
        let topic_id = TopicId::new();
        let result = BattleSession::new(UserId::new(), CharacterId::new(), topic_id, vec![], 3);
        assert_eq!(result.unwrap_err(), EngineError::EmptyEncounter { topic_id });
    }

    #[test]
    fn test_three_correct_answers_win() {
        let mut battle = session(3, 3);

        let first = battle.submit_answer(true).unwrap();
        assert_eq!(first.advanced_to, Some(1));
        battle.submit_answer(true).unwrap();
        let last = battle.submit_answer(true).unwrap();

        assert_eq!(last.state, BattleState::Won);
        assert_eq!(last.advanced_to, None);
        assert_eq!(battle.enemy_life(), 0);
        assert_eq!(battle.error_count(), 0);
        assert_eq!(battle.correct_answers(), 3);
    }

    #[test]
    fn test_player_falls_before_enemy() {
        let mut battle = session(5, 2);

        battle.submit_answer(false).unwrap();
        battle.submit_answer(true).unwrap();
        let resolution = battle.submit_answer(false).unwrap();

        assert_eq!(resolution.state, BattleState::Lost);
        assert_eq!(battle.player_life(), 0);
        assert_eq!(battle.enemy_life(), 4);
        assert_eq!(battle.error_count(), 2);
    }

    #[test]
    fn test_answers_after_terminal_state_change_nothing() {
        let mut battle = session(1, 3);
        battle.submit_answer(true).unwrap();
        assert_eq!(battle.state(), BattleState::Won);

        let before = battle.snapshot();
        assert_eq!(battle.submit_answer(false), Err(EngineError::SessionTerminal));
        assert_eq!(battle.submit_answer(true), Err(EngineError::SessionTerminal));
        assert_eq!(battle.snapshot(), before);

        let mut lost = session(3, 1);
        lost.submit_answer(false).unwrap();
        let before = lost.snapshot();
        assert_eq!(lost.submit_answer(true), Err(EngineError::SessionTerminal));
        assert_eq!(lost.snapshot(), before);
    }

    #[test]
    fn test_last_question_repeats_until_resolved() {
        let mut battle = session(2, 5);

        battle.submit_answer(true).unwrap();
        assert_eq!(battle.current_question_index(), 1);
        let miss = battle.submit_answer(false).unwrap();
        assert_eq!(miss.advanced_to, None);
        assert_eq!(battle.current_question_index(), 1);
        assert_eq!(battle.state(), BattleState::InProgress);

        let hit = battle.submit_answer(true).unwrap();
        assert_eq!(hit.state, BattleState::Won);
        assert_eq!(battle.error_count(), 1);
    }

    #[test]
    fn test_zero_life_is_floored() {
        let battle = session(2, 0);
        assert_eq!(battle.total_life(), 1);
        assert_eq!(battle.player_life(), 1);
    }

    #[test]
    fn test_choice_is_graded_against_current_question() {
        let mut battle = session(2, 3);
        let wrong = battle.current_question().answers[1].id;
        let resolution = battle.submit_choice(wrong).unwrap();
        assert!(!resolution.correct);
        assert_eq!(battle.error_count(), 1);

        let stale = battle.questions[0].answers[0].id;
        assert_eq!(battle.submit_choice(stale), Err(EngineError::UnknownAnswer));
        assert_eq!(battle.error_count(), 1);
        assert_eq!(battle.correct_answers(), 0);
    }

    #[test]
    fn test_snapshot_hides_correctness() {
        let battle = session(1, 3);
        let snapshot = battle.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["question"]["options"][0].get("is_correct").is_none());
        assert_eq!(snapshot.question.options.len(), 2);
    }
}
