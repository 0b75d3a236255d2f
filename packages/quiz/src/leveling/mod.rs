//! Leveling Engine
//!
//! Exponential experience curve:
//! - level 1 needs `round(base_required_xp)` XP
//! - level `n` needs `round(base_required_xp * growth_rate^(n-1))` XP
//!
//! Cumulative XP is walked level by level until the remaining XP no longer
//! covers the next requirement or the level cap (`max_level`, else
//! [`MAX_SUPPORTED_LEVEL`]) is reached.
//! Both correct and incorrect answers grant XP; incorrect ones at a lower
//! fixed rate.

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};
use crate::types::{LevelProgress, XP_PER_CORRECT, XP_PER_INCORRECT};

// ==================== Constants ====================

/// Highest `max_level` a configuration may declare
pub const MAX_SUPPORTED_LEVEL: u32 = 10_000;

/// Level at which the level badge unlocks
pub const LEVEL_BADGE_THRESHOLD: u32 = 5;

// ==================== Configuration ====================

/// Shape of the experience curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSystemConfig {
    pub base_required_xp: f64,
    pub growth_rate: f64,
    pub max_level: Option<u32>,
}

impl Default for LevelSystemConfig {
    fn default() -> Self {
        Self {
            base_required_xp: 100.0,
            growth_rate: 1.2,
            max_level: Some(99),
        }
    }
}

impl LevelSystemConfig {
    /// Reject curves that are malformed or could walk levels forever.
    pub fn validate(&self) -> QuizResult<()> {
        if !self.base_required_xp.is_finite() || !self.growth_rate.is_finite() {
            return Err(QuizError::InvalidLevelConfig(
                "base_required_xp and growth_rate must be finite".to_string(),
            ));
        }
        if self.base_required_xp < 0.0 || self.growth_rate < 0.0 {
            return Err(QuizError::InvalidLevelConfig(
                "base_required_xp and growth_rate must not be negative".to_string(),
            ));
        }

        match self.max_level {
            Some(0) => Err(QuizError::InvalidLevelConfig(
                "max_level must be at least 1".to_string(),
            )),
            Some(max) if max > MAX_SUPPORTED_LEVEL => Err(QuizError::InvalidLevelConfig(format!(
                "max_level {} exceeds {}",
                max, MAX_SUPPORTED_LEVEL
            ))),
            Some(_) => Ok(()),
            // 没有上限时, 每级所需经验必须不减且至少为 1, 否则循环可能不终止
            None if self.growth_rate < 1.0 || self.base_required_xp.round() < 1.0 => {
                Err(QuizError::InvalidLevelConfig(
                    "an uncapped curve needs growth_rate >= 1 and base_required_xp >= 1".to_string(),
                ))
            }
            None => Ok(()),
        }
    }
}

// ==================== Curve ====================

fn round_xp(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // f64::round: 四舍五入, .5 远离零
        value.round() as u64
    } else if value == f64::INFINITY {
        u64::MAX
    } else {
        0
    }
}

/// XP needed to advance from `level` to `level + 1`.
pub fn required_xp_for_level(level: u32, config: &LevelSystemConfig) -> u64 {
    if level <= 1 {
        return round_xp(config.base_required_xp);
    }

    let scaled = config.base_required_xp * config.growth_rate.powf(f64::from(level - 1));
    round_xp(scaled)
}

/// Level and in-level progress for a cumulative XP total.
///
/// Negative totals count as zero. An uncapped curve stops at
/// [`MAX_SUPPORTED_LEVEL`].
pub fn calculate_level_progress(total_xp: i64, config: &LevelSystemConfig) -> QuizResult<LevelProgress> {
    config.validate()?;

    let safe_total = total_xp.max(0) as u64;
    let level_cap = config.max_level.unwrap_or(MAX_SUPPORTED_LEVEL);
    let mut level: u32 = 1;
    let mut xp_spent: u64 = 0;

    loop {
        let required = required_xp_for_level(level, config);

        if level >= level_cap {
            return Ok(LevelProgress {
                level: level_cap,
                total_xp: safe_total,
                xp_into_level: required,
                xp_for_next_level: 0,
                xp_till_next_level: 0,
                progress_ratio: 1.0,
            });
        }

        if xp_spent.saturating_add(required) > safe_total {
            let xp_into_level = safe_total - xp_spent;
            let progress_ratio = if required == 0 {
                1.0
            } else {
                xp_into_level as f64 / required as f64
            };

            return Ok(LevelProgress {
                level,
                total_xp: safe_total,
                xp_into_level,
                xp_for_next_level: required,
                xp_till_next_level: required - xp_into_level,
                progress_ratio,
            });
        }

        xp_spent += required;
        level += 1;
    }
}

// ==================== Experience ====================

/// XP earned by one quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceGain {
    pub gained_xp: u64,
    pub next_total_xp: u64,
}

pub fn get_experience_points(correct_count: usize, incorrect_count: usize, current_xp: u64) -> ExperienceGain {
    let correct_xp = (correct_count as u64).saturating_mul(XP_PER_CORRECT);
    let incorrect_xp = (incorrect_count as u64).saturating_mul(XP_PER_INCORRECT);
    let gained_xp = correct_xp.saturating_add(incorrect_xp);

    ExperienceGain {
        gained_xp,
        next_total_xp: current_xp.saturating_add(gained_xp),
    }
}

pub fn is_level_badge_unlocked(level: u32) -> bool {
    level >= LEVEL_BADGE_THRESHOLD
}
