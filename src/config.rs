/// External configuration loader.
///
/// Reads `config.toml` from the first candidate directory that has one.
/// Falls back to sensible defaults if the file is missing or incomplete.

use log::{info, warn};
use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub sound: SoundConfig,
}

/// Tunables of the game session. Initial snake/food positions are fixed
/// and not part of the config.
#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub board_size: i32,
    pub base_speed_ms: u64,
    pub min_speed_ms: u64,
    pub speed_step_ms: u64,
    pub points_per_food: u32,
    pub food_policy: FoodPolicy,
}

/// Where newly spawned food may land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodPolicy {
    /// Any cell on the board, including under the snake or on the old food.
    Anywhere,
    /// Only cells not covered by the snake.
    FreeCell,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SoundConfig {
    pub enabled: bool,
    pub eat_volume: f32,
    pub game_over_volume: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            board_size: default_board_size(),
            base_speed_ms: default_base_speed(),
            min_speed_ms: default_min_speed(),
            speed_step_ms: default_speed_step(),
            points_per_food: default_points(),
            food_policy: default_food_policy(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    sound: TomlSound,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_board_size")]
    board_size: i32,
    #[serde(default = "default_base_speed")]
    base_speed_ms: u64,
    #[serde(default = "default_min_speed")]
    min_speed_ms: u64,
    #[serde(default = "default_speed_step")]
    speed_step_ms: u64,
    #[serde(default = "default_points")]
    points_per_food: u32,
    #[serde(default = "default_food_policy")]
    food_policy: FoodPolicy,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_sound_enabled")]
    enabled: bool,
    #[serde(default = "default_eat_volume")]
    eat_volume: f32,
    #[serde(default = "default_game_over_volume")]
    game_over_volume: f32,
}

// ── Defaults ──

fn default_board_size() -> i32 { 18 }
fn default_base_speed() -> u64 { 150 }
fn default_min_speed() -> u64 { 70 }
fn default_speed_step() -> u64 { 5 }
fn default_points() -> u32 { 10 }
fn default_food_policy() -> FoodPolicy { FoodPolicy::Anywhere }

fn default_sound_enabled() -> bool { true }
fn default_eat_volume() -> f32 { 0.3 }
fn default_game_over_volume() -> f32 { 0.8 }

/// The initial snake sits at (7,7), so anything smaller cannot start a game.
const MIN_BOARD_SIZE: i32 = 8;
const MAX_BOARD_SIZE: i32 = 64;

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            board_size: default_board_size(),
            base_speed_ms: default_base_speed(),
            min_speed_ms: default_min_speed(),
            speed_step_ms: default_speed_step(),
            points_per_food: default_points(),
            food_policy: default_food_policy(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound {
            enabled: default_sound_enabled(),
            eat_volume: default_eat_volume(),
            game_over_volume: default_game_over_volume(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, ~/.local/share/snakemania, /usr/share/snakemania.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        load_from(&search_dirs)
    }

    /// Parse a config document. Used by `load` and by tests.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let g = cfg.game;

        let board_size = g.board_size.clamp(MIN_BOARD_SIZE, MAX_BOARD_SIZE);
        if board_size != g.board_size {
            warn!("board_size {} out of range, using {}", g.board_size, board_size);
        }
        let min_speed_ms = g.min_speed_ms.max(1);
        let base_speed_ms = if g.base_speed_ms < min_speed_ms {
            warn!("base_speed_ms {} below min_speed_ms {}, raising it", g.base_speed_ms, min_speed_ms);
            min_speed_ms
        } else {
            g.base_speed_ms
        };

        GameConfig {
            rules: RulesConfig {
                board_size,
                base_speed_ms,
                min_speed_ms,
                speed_step_ms: g.speed_step_ms,
                points_per_food: g.points_per_food,
                food_policy: g.food_policy,
            },
            sound: SoundConfig {
                enabled: cfg.sound.enabled,
                eat_volume: cfg.sound.eat_volume.clamp(0.0, 1.0),
                game_over_volume: cfg.sound.game_over_volume.clamp(0.0, 1.0),
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/snakemania)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/snakemania");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/snakemania");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_from(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match GameConfig::parse(&text) {
                    Ok(cfg) => {
                        info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        warn!("config.toml parse error: {e}; using default settings");
                        return GameConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    GameConfig::default()
}
