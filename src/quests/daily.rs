//! Daily quests.
//!
//! Three quests are drawn without replacement from the template pool every
//! 24 hours, measured from the batch's own creation time rather than
//! calendar midnight. A quest completes exactly once; completed quests are
//! frozen and ignore further progress.

use serde::{Deserialize, Serialize};

use crate::core::rng::GameRng;

/// Wall-clock lifetime of a quest batch.
pub const QUEST_ROTATION_MS: i64 = 24 * 60 * 60 * 1000;

/// Quests per batch.
pub const QUESTS_PER_BATCH: usize = 3;

/// Single stake that satisfies the big-bet quest.
pub const BIG_BET_THRESHOLD: i64 = 1_000;

// =============================================================================
// TEMPLATES
// =============================================================================

/// The closed template pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestKind {
    /// Win N games (accumulating).
    WinCount,
    /// Play N games (accumulating).
    PlayCount,
    /// Win N PvP duels (accumulating).
    PvpWinCount,
    /// Stake N total across games (accumulating by stake).
    BetTotal,
    /// Lose N games (accumulating).
    LoseCount,
    /// Reach a win streak of N (latches to the current streak).
    WinStreak,
    /// Play N PvP duels (accumulating).
    PvpPlayCount,
    /// Place one stake of 1000+ (latches to 1).
    BigBet,
}

impl QuestKind {
    pub const ALL: [QuestKind; 8] = [
        QuestKind::WinCount,
        QuestKind::PlayCount,
        QuestKind::PvpWinCount,
        QuestKind::BetTotal,
        QuestKind::LoseCount,
        QuestKind::WinStreak,
        QuestKind::PvpPlayCount,
        QuestKind::BigBet,
    ];

    /// (target, reward money, reward XP, title).
    pub fn template(self) -> (u64, i64, u64, &'static str) {
        match self {
            QuestKind::WinCount => (3, 150, 200, "Win 3 games"),
            QuestKind::PlayCount => (10, 250, 300, "Play 10 games"),
            QuestKind::PvpWinCount => (1, 500, 500, "Win a PvP duel"),
            QuestKind::BetTotal => (5_000, 300, 400, "Stake 5000 in total"),
            QuestKind::LoseCount => (3, 100, 150, "Lose 3 games"),
            QuestKind::WinStreak => (3, 300, 400, "Reach a 3-win streak"),
            QuestKind::PvpPlayCount => (5, 400, 600, "Play 5 PvP duels"),
            QuestKind::BigBet => (1, 200, 300, "Place a 1000+ stake"),
        }
    }
}

// =============================================================================
// QUEST INSTANCE
// =============================================================================

/// One active quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quest {
    pub kind: QuestKind,
    pub progress: u64,
    pub target: u64,
    pub completed: bool,
}

impl Default for Quest {
    fn default() -> Self {
        Self::new(QuestKind::PlayCount)
    }
}

impl Quest {
    pub fn new(kind: QuestKind) -> Self {
        let (target, _, _, _) = kind.template();
        Self {
            kind,
            progress: 0,
            target,
            completed: false,
        }
    }
}

/// Draw a fresh batch: 3 templates, no duplicates.
pub fn draw_batch(rng: &mut GameRng) -> Vec<Quest> {
    let mut pool = QuestKind::ALL;
    rng.shuffle(&mut pool);
    pool[..QUESTS_PER_BATCH].iter().map(|&k| Quest::new(k)).collect()
}

/// Whether a batch created at `issued_at_ms` has rotated out by `now_ms`.
pub fn batch_expired(issued_at_ms: i64, now_ms: i64) -> bool {
    now_ms - issued_at_ms >= QUEST_ROTATION_MS
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Progress-relevant things that happen to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestEvent {
    Won,
    Lost,
    Played,
    /// A stake was placed (solo only feeds this).
    BetPlaced(i64),
    PvpWon,
    PvpPlayed,
    /// The win streak reached this value.
    StreakReached(u32),
}

/// Apply one event to a quest list.
///
/// Returns the kinds that completed on this event, each exactly once;
/// already-completed quests are never touched again.
pub fn apply_event(quests: &mut [Quest], event: QuestEvent) -> Vec<QuestKind> {
    let mut completed = Vec::new();
    for quest in quests.iter_mut() {
        if quest.completed {
            continue;
        }
        let progress = match (quest.kind, event) {
            (QuestKind::WinCount, QuestEvent::Won) => quest.progress + 1,
            (QuestKind::PlayCount, QuestEvent::Played) => quest.progress + 1,
            (QuestKind::PvpWinCount, QuestEvent::PvpWon) => quest.progress + 1,
            (QuestKind::BetTotal, QuestEvent::BetPlaced(stake)) => {
                quest.progress + stake.max(0) as u64
            }
            (QuestKind::LoseCount, QuestEvent::Lost) => quest.progress + 1,
            // Latch, not cumulative: a broken streak drops the progress.
            (QuestKind::WinStreak, QuestEvent::StreakReached(streak)) => streak as u64,
            (QuestKind::PvpPlayCount, QuestEvent::PvpPlayed) => quest.progress + 1,
            (QuestKind::BigBet, QuestEvent::BetPlaced(stake)) if stake >= BIG_BET_THRESHOLD => 1,
            _ => continue,
        };
        quest.progress = progress;
        if progress >= quest.target {
            quest.completed = true;
            completed.push(quest.kind);
        }
    }
    completed
}

// =============================================================================
// TESTS
// =============================================================================
