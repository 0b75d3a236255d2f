mod config;
mod data;
mod logging;
mod play;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use danci_quiz::progress::summarize;
use danci_quiz::storage::now_millis;
use danci_quiz::{
    build_stage_questions, build_stage_unlock_map, is_level_badge_unlocked, merge_registry, shuffle_choices,
    FileStore, LevelSystemConfig, PlayerRegistryStore, ProgressStore, Registry, ResultsStore, SessionRecord,
    SliceOrder, StageDefinition, StageDefinitionCache, StageDefinitionInput, StageResultPayload, StageStatus,
    UserConfigStore,
};

use config::Config;

/// Session history bucket for quizzes started from the terminal
const CLI_TEST_ID: &str = "cli";

#[derive(Parser)]
#[command(name = "danci-quiz", version, about = "Stage-based vocabulary quizzes")]
struct Cli {
    /// Log more to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List data-sets and their stage counts
    List,
    /// Show the stages of a data-set
    Stages { key: String },
    /// Play one stage
    Play {
        key: String,
        /// 1-based stage number
        stage: u32,
        /// Seed for reproducible choice order
        #[arg(long)]
        seed: Option<u64>,
        /// Shuffle the word list before slicing out the stage
        #[arg(long)]
        shuffle: bool,
    },
    /// Show the current level
    Level,
    /// Set the per-stage question count of a data-set
    SetCount { key: String, count: i64 },
    /// Import a JSON word list as a player data-set
    Import { file: PathBuf },
    /// Remove an imported data-set by id
    RemoveImport { id: String },
}

struct App {
    config: Config,
    store: Arc<FileStore>,
}

impl App {
    fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.storage_dir)
            .with_context(|| format!("creating storage directory {}", config.storage_dir.display()))?;
        let store = Arc::new(FileStore::new(&config.storage_dir));
        Ok(Self { config, store })
    }

    fn registry(&self) -> Result<Registry> {
        let base = data::load_data_sets(&self.config.data_dir)?;
        let player = PlayerRegistryStore::new(Arc::clone(&self.store)).load();
        Ok(merge_registry(base, &player))
    }

    fn stages(&self, registry: &Registry, key: &str) -> Result<Vec<StageDefinition>> {
        let entry = registry.get(key)?;
        let question_count = UserConfigStore::new(Arc::clone(&self.store))
            .load(registry)
            .question_count(key);

        let result = StageDefinitionCache::new(Arc::clone(&self.store)).create_stage_definitions(&StageDefinitionInput {
            dataset_key: &entry.key,
            label: &entry.label,
            vocab: &entry.vocab,
            base_question_count: question_count,
        });
        Ok(result.stages)
    }

    fn list(&self) -> Result<()> {
        let registry = self.registry()?;
        if registry.is_empty() {
            println!("no data-sets in {}", self.config.data_dir.display());
            return Ok(());
        }

        let progress = ProgressStore::new(Arc::clone(&self.store)).load();
        for entry in registry.entries() {
            let stages = self.stages(&registry, &entry.key)?;
            let summary = summarize(&stages, &progress);
            println!(
                "{:<24} {:<24} {:>3} stages  {:>3} cleared",
                entry.key, entry.label, summary.total_stages, summary.cleared_stages
            );
        }
        Ok(())
    }

    fn show_stages(&self, key: &str) -> Result<()> {
        let registry = self.registry()?;
        let stages = self.stages(&registry, key)?;
        let progress = ProgressStore::new(Arc::clone(&self.store)).load();
        let unlocks = build_stage_unlock_map(&stages, &progress);

        for stage in &stages {
            let unlocked = unlocks.get(&stage.stage_id).copied().unwrap_or(false);
            let (status, best) = match progress.get(&stage.stage_id) {
                Some(entry) => (entry.status(), entry.best_accuracy),
                None => (StageStatus::Untouched, 0.0),
            };
            let marker = match (unlocked, status) {
                (false, _) => "locked",
                (true, StageStatus::Cleared) => "cleared",
                (true, StageStatus::Attempted) => "tried",
                (true, StageStatus::Untouched) => "open",
            };
            println!(
                "{:<28} {:>3} words  {:<8} best {:>5.1}%",
                stage.title,
                stage.question_count,
                marker,
                best * 100.0
            );
        }

        let summary = summarize(&stages, &progress);
        println!(
            "{}/{} cleared, average best {:.1}%",
            summary.cleared_stages,
            summary.total_stages,
            summary.average_best_accuracy * 100.0
        );
        Ok(())
    }

    fn play(&self, key: &str, stage_number: u32, seed: Option<u64>, shuffle: bool) -> Result<()> {
        let registry = self.registry()?;
        let entry = registry.get(key)?;
        let stages = self.stages(&registry, key)?;
        let Some(stage) = stages.iter().find(|stage| stage.stage_number == stage_number) else {
            bail!("{key} has {} stages, no stage {stage_number}", stages.len());
        };

        let progress_store = ProgressStore::new(Arc::clone(&self.store));
        let unlocks = build_stage_unlock_map(&stages, &progress_store.load());
        if !unlocks.get(&stage.stage_id).copied().unwrap_or(false) {
            bail!("{} is locked; clear the previous stage first", stage.title);
        }

        let order = if shuffle {
            SliceOrder::Shuffled { seed }
        } else {
            SliceOrder::Natural
        };
        let questions: Vec<_> = build_stage_questions(&entry.vocab, stage, order)
            .iter()
            .enumerate()
            .map(|(index, question)| shuffle_choices(question, seed.map(|seed| seed.wrapping_add(index as u64))))
            .collect();
        if questions.is_empty() {
            bail!("{} has no playable words", stage.title);
        }

        progress_store.record_stage_attempt(&stage.stage_id);
        println!("{} ({} questions)", stage.title, questions.len());

        let started_at = now_millis();
        let outcome = play::run_quiz(&questions, io::stdin().lock(), io::stdout().lock())?;
        if outcome.aborted {
            println!("\nquiz abandoned after {} answers", outcome.answered());
            return Ok(());
        }
        let finished_at = now_millis();

        let correct_count = u32::try_from(outcome.correct_count)?;
        let incorrect_count = u32::try_from(outcome.incorrect_count)?;
        let state = progress_store.record_stage_result(&StageResultPayload {
            stage_id: stage.stage_id.clone(),
            correct_count,
            total_count: u32::try_from(questions.len())?,
        });

        let results = ResultsStore::new(Arc::clone(&self.store));
        let gain = results.apply_session(outcome.correct_count, outcome.incorrect_count);
        results.add_session(
            CLI_TEST_ID,
            SessionRecord {
                started_at,
                finished_at,
                duration_ms: finished_at.saturating_sub(started_at),
                section_id: entry.section_label.clone(),
                correct_count,
                incorrect_count,
                gained_xp: gain.gained_xp,
            },
        );

        let record = state.get(&stage.stage_id);
        println!(
            "\n{}/{} correct, +{} XP (total {})",
            outcome.correct_count,
            questions.len(),
            gain.gained_xp,
            gain.next_total_xp
        );
        if record.is_some_and(|entry| entry.cleared) {
            println!("{} cleared", stage.title);
        }
        Ok(())
    }

    fn level(&self) -> Result<()> {
        let progress = ResultsStore::new(Arc::clone(&self.store)).level_progress(&LevelSystemConfig::default())?;
        println!(
            "level {}  {}/{} XP  ({} to next, {} total)",
            progress.level,
            progress.xp_into_level,
            progress.xp_for_next_level,
            progress.xp_till_next_level,
            progress.total_xp
        );
        if is_level_badge_unlocked(progress.level) {
            println!("level badge unlocked");
        }
        Ok(())
    }

    fn set_count(&self, key: &str, count: i64) -> Result<()> {
        let registry = self.registry()?;
        let config = UserConfigStore::new(Arc::clone(&self.store)).set_max_count(&registry, key, count)?;
        println!("{key}: {} questions per stage", config.question_count(key));
        Ok(())
    }

    fn import(&self, file: &Path) -> Result<()> {
        let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("{} has no usable file name", file.display()))?;

        let outcome = PlayerRegistryStore::new(Arc::clone(&self.store)).import_json(file_name, &raw)?;
        println!("imported {} words", outcome.words_added);
        for entry in &outcome.entries {
            println!("{:<40} {:<24} {}", entry.id, entry.key, entry.label);
        }
        Ok(())
    }

    fn remove_import(&self, id: &str) -> Result<()> {
        let players = PlayerRegistryStore::new(Arc::clone(&self.store));
        let before = players.load().len();
        let remaining = players.remove(id);
        if remaining.len() == before {
            bail!("no imported data-set with id {id}");
        }
        println!("removed {id}, {} imported data-sets left", remaining.len());
        Ok(())
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let cli = Cli::parse();
    let _log_guard = logging::init_tracing(&config.log_level, cli.verbose);

    let app = App::open(config)?;

    match cli.command {
        Command::List => app.list(),
        Command::Stages { key } => app.show_stages(&key),
        Command::Play {
            key,
            stage,
            seed,
            shuffle,
        } => app.play(&key, stage, seed, shuffle),
        Command::Level => app.level(),
        Command::SetCount { key, count } => app.set_count(&key, count),
        Command::Import { file } => app.import(&file),
        Command::RemoveImport { id } => app.remove_import(&id),
    }
}
