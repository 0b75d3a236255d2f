//! # danci-quiz - 词汇闯关核心引擎
//!
//! 本 crate 把"单词 / 释义"列表变成多选题闯关:
//!
//! - **QuestionBuilder** - 由词条生成四选一题目 (干扰项选择)
//! - **StageComputer** - 把有效词汇切分为固定大小的关卡, 可选缓存
//! - **LevelingEngine** - 经验值曲线: XP -> 等级 / 进度
//! - **ProgressStore** - 关卡掌握度持久化与解锁判定
//!
//! ## 设计理念
//!
//! - **纯函数优先** - 出题、分关、等级计算都不做 I/O
//! - **单一持久化边界** - 所有读写都经过 [`storage::KeyValueStore`]
//! - **可恢复** - 损坏或旧格式的持久化数据在本地恢复为安全默认值, 只记录警告
//! - **可复现** - 所有随机性都集中在 [`shuffle`], 并接受可选种子
//!
//! ## 模块结构
//!
//! - [`question`] - 出题与干扰项
//! - [`stage`] - 关卡划分 ([`stage::cache`] 为关卡定义缓存)
//! - [`leveling`] - 经验值与等级
//! - [`progress`] - 关卡进度与解锁
//! - [`results`] - 累计经验值与答题记录
//! - [`registry`] - 词汇数据集目录 (内置 + 玩家导入)
//! - [`settings`] - 每个数据集的每关题数设置
//! - [`storage`] - 字符串键值存储 (内存 / 文件)
//! - [`shuffle`] - 带种子的洗牌
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use danci_quiz::{
//!     build_stage_questions, create_stage_definitions, SliceOrder, StageDefinitionInput,
//!     VocabularyEntry,
//! };
//!
//! let vocab = vec![
//!     VocabularyEntry::new("one", "1"),
//!     VocabularyEntry::new("two", "2"),
//!     VocabularyEntry::new("three", "3"),
//! ];
//! let result = create_stage_definitions(&StageDefinitionInput {
//!     dataset_key: "demo",
//!     label: "Demo",
//!     vocab: &vocab,
//!     base_question_count: 2,
//! });
//! assert_eq!(result.stages.len(), 2);
//!
//! let questions = build_stage_questions(&vocab, &result.stages[1], SliceOrder::Natural);
//! assert_eq!(questions[0].phrase, "three");
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod error;
pub mod leveling;
pub mod progress;
pub mod question;
pub mod registry;
pub mod results;
pub mod settings;
pub mod shuffle;
pub mod stage;
pub mod storage;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use error::{QuizError, QuizResult};

pub use leveling::{
    calculate_level_progress, get_experience_points, is_level_badge_unlocked,
    required_xp_for_level, ExperienceGain, LevelSystemConfig,
};

pub use progress::{build_stage_unlock_map, ProgressStore, ProgressSummary, StageResultPayload};

pub use question::build_questions;

pub use registry::{merge_registry, PlayerRegistryEntry, PlayerRegistryStore, Registry, RegistryEntry};

pub use results::{ResultsStore, SessionRecord};

pub use settings::{DataSetConfig, UserConfig, UserConfigStore};

pub use shuffle::{shuffle_choices, shuffle_items};

pub use stage::cache::StageDefinitionCache;
pub use stage::{
    build_stage_id, build_stage_questions, calculate_stage_summary, create_stage_definitions,
    filter_valid_entries, normalize_question_count, SliceOrder, StageDefinitionInput,
    StageDefinitionResult, StageDefinitionSummary,
};

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
