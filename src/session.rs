//! The game session: score, lives, combo and item counters shared by every level.
//!
//! `GameSession` is a single ECS resource. All rules are plain methods with the clock passed in
//! as milliseconds, so the scoring loop can be exercised without a running app.

use bevy::prelude::*;

/// Two collections closer together than this keep the combo going.
pub const COMBO_WINDOW_MS: u64 = 3_000;
pub const STARTING_LIVES: u32 = 3;
pub const MAX_LIVES: u32 = 5;

/// Result of a single `add_score` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAward {
    pub points: u32,
    pub multiplier: u32,
}

/// Snapshot rendered by the in-game HUD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudData {
    pub score: u32,
    pub lives: u32,
    pub level: u8,
    pub combo: u32,
    pub multiplier: u32,
    pub items: String,
}

/// Snapshot rendered by the victory screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndScreenData {
    pub score: u32,
    pub high_score: u32,
    pub stars: u8,
    pub items_collected: u32,
    pub total_items: u32,
    pub percentage: u32,
    pub max_combo: u32,
}

#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub score: u32,
    pub lives: u32,
    pub current_level: u8,
    pub items_collected: u32,
    pub total_items: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub high_score: u32,
    last_collect_ms: Option<u64>,
    high_score_dirty: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::with_high_score(0)
    }
}

impl GameSession {
    pub fn with_high_score(high_score: u32) -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
            current_level: 1,
            items_collected: 0,
            total_items: 0,
            combo: 0,
            max_combo: 0,
            high_score,
            last_collect_ms: None,
            high_score_dirty: false,
        }
    }

    /// Starts a fresh run. The high score survives.
    pub fn reset(&mut self) {
        *self = Self::with_high_score(self.high_score);
    }

    /// Awards `points` scaled by the combo multiplier in effect *before* this collection, then
    /// advances the combo.
    pub fn add_score(&mut self, points: u32, now_ms: u64) -> ScoreAward {
        let multiplier = self.combo_multiplier();
        let awarded = points * multiplier;
        self.score += awarded;

        let within_window = self
            .last_collect_ms
            .map(|last| now_ms.saturating_sub(last) < COMBO_WINDOW_MS)
            .unwrap_or(false);

        if within_window {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else {
            self.combo = 1;
        }
        self.last_collect_ms = Some(now_ms);

        if self.score > self.high_score {
            self.high_score = self.score;
            self.high_score_dirty = true;
        }

        ScoreAward {
            points: awarded,
            multiplier,
        }
    }

    pub fn combo_multiplier(&self) -> u32 {
        match self.combo {
            c if c >= 5 => 3,
            c if c >= 3 => 2,
            _ => 1,
        }
    }

    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.reset_combo();
        self.lives
    }

    pub fn gain_life(&mut self) -> u32 {
        self.lives = (self.lives + 1).min(MAX_LIVES);
        self.lives
    }

    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    pub fn next_level(&mut self) -> u8 {
        self.current_level += 1;
        self.items_collected = 0;
        self.total_items = 0;
        self.current_level
    }

    /// Re-arms the per-level counters, used whenever a level is (re)built.
    pub fn begin_level(&mut self, level: u8, total_items: u32) {
        self.current_level = level;
        self.items_collected = 0;
        self.set_total_items(total_items);
    }

    pub fn collect_item(&mut self) {
        self.items_collected += 1;
    }

    pub fn set_total_items(&mut self, total: u32) {
        self.total_items = total;
    }

    pub fn collection_percentage(&self) -> u32 {
        if self.total_items == 0 {
            return 0;
        }
        (self.items_collected * 100 / self.total_items).min(100)
    }

    pub fn stars(&self) -> u8 {
        match self.collection_percentage() {
            p if p >= 90 => 3,
            p if p >= 50 => 2,
            _ => 1,
        }
    }

    /// Hands out the high score once per improvement so the store only writes when needed.
    pub fn take_unsaved_high_score(&mut self) -> Option<u32> {
        if !self.high_score_dirty {
            return None;
        }
        self.high_score_dirty = false;
        Some(self.high_score)
    }

    pub fn hud_data(&self) -> HudData {
        HudData {
            score: self.score,
            lives: self.lives,
            level: self.current_level,
            combo: self.combo,
            multiplier: self.combo_multiplier(),
            items: format!("{}/{}", self.items_collected, self.total_items),
        }
    }

    pub fn end_screen_data(&self) -> EndScreenData {
        EndScreenData {
            score: self.score,
            high_score: self.high_score,
            stars: self.stars(),
            items_collected: self.items_collected,
            total_items: self.total_items,
            percentage: self.collection_percentage(),
            max_combo: self.max_combo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_defaults() {
        let session = GameSession::default();
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, 3);
        assert_eq!(session.current_level, 1);
        assert_eq!(session.combo_multiplier(), 1);
        assert!(!session.is_game_over());
    }

    #[test]
    fn rapid_collections_build_the_combo() {
        let mut session = GameSession::default();
        let awards: Vec<ScoreAward> = (0..7)
            .map(|i| session.add_score(10, 1_000 + i * 500))
            .collect();

        // The multiplier is read before the combo advances.
        let multipliers: Vec<u32> = awards.iter().map(|a| a.multiplier).collect();
        assert_eq!(multipliers, vec![1, 1, 1, 2, 2, 3, 3]);
        assert_eq!(session.combo, 7);
        assert_eq!(session.max_combo, 7);
        assert_eq!(session.score, 10 + 10 + 10 + 20 + 20 + 30 + 30);
    }

    #[test]
    fn slow_collection_restarts_the_combo() {
        let mut session = GameSession::default();
        session.add_score(10, 0);
        session.add_score(10, 2_999);
        session.add_score(10, 4_000);
        assert_eq!(session.combo, 3);

        session.add_score(10, 7_000);
        assert_eq!(session.combo, 1);
        assert_eq!(session.max_combo, 3);
    }

    #[test]
    fn gap_of_exactly_the_window_breaks_the_combo() {
        let mut session = GameSession::default();
        session.add_score(10, 5_000);
        session.add_score(10, 8_000);
        assert_eq!(session.combo, 1);
    }

    #[test]
    fn multiplier_tiers() {
        let mut session = GameSession::default();
        for (combo, expected) in [(0, 1), (2, 1), (3, 2), (4, 2), (5, 3), (12, 3)] {
            session.combo = combo;
            assert_eq!(session.combo_multiplier(), expected, "combo {combo}");
        }
    }

    #[test]
    fn losing_a_life_resets_the_combo_and_saturates() {
        let mut session = GameSession::default();
        session.combo = 4;
        assert_eq!(session.lose_life(), 2);
        assert_eq!(session.combo, 0);
        session.lose_life();
        session.lose_life();
        assert!(session.is_game_over());
        assert_eq!(session.lose_life(), 0);
    }

    #[test]
    fn gaining_lives_caps_at_five() {
        let mut session = GameSession::default();
        for _ in 0..10 {
            session.gain_life();
        }
        assert_eq!(session.lives, MAX_LIVES);
    }

    #[test]
    fn high_score_only_moves_when_beaten() {
        let mut session = GameSession::with_high_score(100);
        session.add_score(50, 0);
        assert_eq!(session.high_score, 100);
        assert_eq!(session.take_unsaved_high_score(), None);

        session.add_score(60, 10_000);
        assert_eq!(session.high_score, 110);
        assert_eq!(session.take_unsaved_high_score(), Some(110));
        assert_eq!(session.take_unsaved_high_score(), None);
    }

    #[test]
    fn reset_keeps_the_high_score() {
        let mut session = GameSession::default();
        session.add_score(500, 0);
        session.lose_life();
        session.next_level();
        session.reset();
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, 3);
        assert_eq!(session.current_level, 1);
        assert_eq!(session.high_score, 500);
    }

    #[test]
    fn next_level_clears_item_counters() {
        let mut session = GameSession::default();
        session.set_total_items(16);
        session.collect_item();
        assert_eq!(session.next_level(), 2);
        assert_eq!(session.hud_data().items, "0/0");
    }

    #[test]
    fn stars_follow_collection_percentage() {
        let mut session = GameSession::default();
        assert_eq!(session.collection_percentage(), 0);
        assert_eq!(session.stars(), 1);

        session.begin_level(3, 10);
        for _ in 0..5 {
            session.collect_item();
        }
        assert_eq!(session.collection_percentage(), 50);
        assert_eq!(session.stars(), 2);

        for _ in 0..4 {
            session.collect_item();
        }
        assert_eq!(session.stars(), 3);
    }

    #[test]
    fn percentage_rounds_down() {
        let mut session = GameSession::default();
        session.begin_level(1, 3);
        session.collect_item();
        assert_eq!(session.collection_percentage(), 33);
    }

    #[test]
    fn end_screen_reports_the_run() {
        let mut session = GameSession::default();
        session.begin_level(3, 10);
        for i in 0..10 {
            session.add_score(10, i * 100);
            session.collect_item();
        }
        let data = session.end_screen_data();
        assert_eq!(data.items_collected, 10);
        assert_eq!(data.percentage, 100);
        assert_eq!(data.stars, 3);
        assert_eq!(data.max_combo, 10);
        assert_eq!(data.high_score, data.score);
    }
}
