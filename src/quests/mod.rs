//! Retention mechanics: rotating daily quests and permanent achievements.

pub mod achievements;
pub mod daily;

pub use achievements::AchievementId;
pub use daily::{Quest, QuestEvent, QuestKind};
