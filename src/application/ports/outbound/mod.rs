//! Outbound ports - Interfaces that the application requires from external systems

mod repository_port;
mod reward_port;

pub use repository_port::{
    CatalogRepositoryPort, CharacterRepositoryPort, EquipmentRepositoryPort,
    ProgressRepositoryPort, QuestionSupplyPort, RepoError,
};
pub use reward_port::RewardIssuerPort;

#[cfg(test)]
pub use repository_port::{
    MockCatalogRepositoryPort, MockCharacterRepositoryPort, MockEquipmentRepositoryPort,
    MockProgressRepositoryPort, MockQuestionSupplyPort,
};
#[cfg(test)]
pub use reward_port::MockRewardIssuerPort;
