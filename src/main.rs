/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{debug, info, warn};

use config::GameConfig;
use sim::event::GameEvent;
use sim::save::{self, FileScoreStore, MemoryScoreStore, ScoreStore};
use sim::scheduler::TickScheduler;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Roughly two seconds of frames.
const MESSAGE_FRAMES: u32 = 400;

const LOG_ENV: &str = "SNAKEMANIA_LOG";
const LOG_FILE: &str = "snakemania.log";

fn main() {
    init_logging();

    let config = GameConfig::load();

    let mut store: Box<dyn ScoreStore> = match FileScoreStore::open_default() {
        Ok(file) => {
            info!("score store at {}", file.path().display());
            Box::new(file)
        }
        Err(e) => {
            warn!("score file unavailable, high score kept in memory: {e}");
            Box::new(MemoryScoreStore::new())
        }
    };
    let high_score = save::load_high_score(store.as_ref());

    let mut world = WorldState::new(config.rules.clone(), high_score);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new(&config.sound);

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), store.as_mut());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    info!("exit: score {} high {}", world.score, world.high_score);
    println!();
    println!("Thanks for playing Snake Mania!");
    println!("Final Score: {}", world.score);
    println!("High Score:  {}", world.high_score);
}

/// Log to a file next to the score store; the terminal is in raw mode.
fn init_logging() {
    let path = save::data_dir().join(LOG_FILE);
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(_) => return,
    };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .write_style(env_logger::WriteStyle::Never)
        .init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    store: &mut dyn ScoreStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut rng = rand::thread_rng();
    let mut ticker = TickScheduler::new();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &mut ticker) {
            break;
        }

        apply_directions(world, &kb, &mut ticker);

        if ticker.poll(Instant::now()) {
            let events = step::step(world, &mut rng);
            process_events(world, &events, &mut ticker, store);
            sound::play_events(sound, &events);
        }

        // Global: tick message timer (works in all phases)
        world.tick_message();

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    ticker.cancel();
    Ok(())
}

/// Feed this frame's arrow presses to the session. Every accepted change re-arms.
fn apply_directions(world: &mut WorldState, kb: &InputState, ticker: &mut TickScheduler) {
    if !world.is_running() || world.paused { return; }
    for dir in kb.directions() {
        if step::set_direction(world, dir) {
            debug!("direction {:?}", dir);
            rearm(ticker, world);
        }
    }
}

/// Cancel the live timer and schedule a fresh one at the current speed.
fn rearm(ticker: &mut TickScheduler, world: &WorldState) {
    ticker.arm(Duration::from_millis(world.speed_ms), Instant::now());
    debug!("timer armed: gen {} every {}ms", ticker.generation(), world.speed_ms);
}

fn process_events(
    world: &mut WorldState,
    events: &[GameEvent],
    ticker: &mut TickScheduler,
    store: &mut dyn ScoreStore,
) {
    for event in events {
        match event {
            GameEvent::FoodEaten { at, score } => {
                debug!("ate food at ({}, {}), score {}", at.x, at.y, score);
            }
            GameEvent::SpeedChanged { interval_ms } => {
                debug!("speed now {}ms", interval_ms);
                rearm(ticker, world);
            }
            GameEvent::NewHighScore { score } => {
                info!("new high score {}", score);
                if !save::persist_high_score(store, *score) {
                    world.set_message("High score could not be saved", MESSAGE_FRAMES);
                }
            }
            GameEvent::GameOver { cause, score } => {
                info!("game over ({:?}) with score {}", cause, score);
                ticker.cancel();
            }
            GameEvent::FoodSpawned { at } => {
                debug!("food spawned at ({}, {})", at.x, at.y);
            }
        }
    }
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Start (or restart) a session and arm the ticker at base speed.
fn start_game(world: &mut WorldState, ticker: &mut TickScheduler) {
    step::restart(world);
    rearm(ticker, world);
    info!("game started");
}

/// Phase and pause keys. Returns true when the player asked to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, ticker: &mut TickScheduler) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.was_pressed(KeyCode::Esc);

    match world.phase {
        Phase::Title => {
            if esc || kb.any_pressed(KEYS_QUIT) {
                return true;
            }
            if confirm {
                start_game(world, ticker);
            }
        }
        Phase::Playing => {
            if esc {
                ticker.cancel();
                world.paused = false;
                world.phase = Phase::Title;
                return false;
            }
            if kb.any_pressed(KEYS_PAUSE) {
                world.paused = !world.paused;
                if world.paused {
                    ticker.cancel();
                } else {
                    rearm(ticker, world);
                }
                debug!("paused={} timer armed={}", world.paused, ticker.is_armed());
            }
        }
        Phase::GameOver => {
            if esc {
                world.phase = Phase::Title;
                return false;
            }
            if confirm || kb.any_pressed(KEYS_RESTART) {
                start_game(world, ticker);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use crossterm::event::{Event, KeyEvent, KeyModifiers};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::config::RulesConfig;
    use crate::domain::entity::{Cell, Direction};
    use crate::sim::save::{StoreError, HIGH_SCORE_KEY};

    fn keys(codes: &[KeyCode]) -> InputState {
        let mut kb = InputState::new();
        for &code in codes {
            kb.record(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
        }
        kb
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Title screen, then Enter.
    fn started() -> (WorldState, TickScheduler) {
        let mut world = WorldState::new(RulesConfig::default(), 0);
        let mut ticker = TickScheduler::new();
        assert!(!handle_meta(&mut world, &keys(&[KeyCode::Enter]), &mut ticker));
        (world, ticker)
    }

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<u32>, StoreError> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: u32) -> Result<(), StoreError> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full").into())
        }
    }

    /// Step until the run ends, routing events the way the game loop does.
    fn play_out(world: &mut WorldState, ticker: &mut TickScheduler, store: &mut dyn ScoreStore) {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            if world.phase == Phase::GameOver { break; }
            let events = step::step(world, &mut rng);
            process_events(world, &events, ticker, store);
        }
        assert_eq!(world.phase, Phase::GameOver);
    }

    #[test]
    fn start_arms_at_base_speed() {
        let (world, ticker) = started();
        assert_eq!(world.phase, Phase::Playing);
        assert!(ticker.is_armed());
        assert_eq!(ticker.interval(), Some(ms(150)));
        assert_eq!(ticker.generation(), 1);
    }

    #[test]
    fn eating_rearms_at_faster_speed() {
        let (mut world, mut ticker) = started();
        let mut store = MemoryScoreStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        world.food = Cell::new(8, 7);

        let events = step::step(&mut world, &mut rng);
        process_events(&mut world, &events, &mut ticker, &mut store);

        assert_eq!(world.score, 10);
        assert_eq!(ticker.generation(), 2);
        assert_eq!(ticker.interval(), Some(ms(145)));
    }

    #[test]
    fn plain_move_keeps_the_live_timer() {
        let (mut world, mut ticker) = started();
        let mut store = MemoryScoreStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let events = step::step(&mut world, &mut rng);
        process_events(&mut world, &events, &mut ticker, &mut store);

        assert_eq!(ticker.generation(), 1);
        assert_eq!(ticker.interval(), Some(ms(150)));
    }

    #[test]
    fn game_over_cancels_timer_and_persists_high_score() {
        let (mut world, mut ticker) = started();
        let mut store = MemoryScoreStore::new();
        world.food = Cell::new(8, 7);

        play_out(&mut world, &mut ticker, &mut store);

        assert!(!ticker.is_armed());
        assert!(world.score >= 10);
        assert_eq!(world.high_score, world.score);
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap(), Some(world.score));
        assert!(world.message.is_empty());
    }

    #[test]
    fn scoreless_game_over_writes_nothing() {
        let (mut world, mut ticker) = started();
        let mut store = MemoryScoreStore::new();
        world.food = Cell::new(0, 0);

        play_out(&mut world, &mut ticker, &mut store);

        assert!(!ticker.is_armed());
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap(), None);
    }

    #[test]
    fn failed_persist_shows_message() {
        let (mut world, mut ticker) = started();
        world.food = Cell::new(8, 7);

        play_out(&mut world, &mut ticker, &mut BrokenStore);

        assert_eq!(world.message, "High score could not be saved");
        assert_eq!(world.message_timer, MESSAGE_FRAMES);
        assert_eq!(world.high_score, world.score);
    }

    #[test]
    fn accepted_arrow_rearms_rejected_reversal_does_not() {
        let (mut world, mut ticker) = started();

        apply_directions(&mut world, &keys(&[KeyCode::Up]), &mut ticker);
        assert_eq!(world.pending, Direction::Up);
        assert_eq!(ticker.generation(), 2);

        // Left reverses the committed Right.
        apply_directions(&mut world, &keys(&[KeyCode::Left]), &mut ticker);
        assert_eq!(world.pending, Direction::Up);
        assert_eq!(ticker.generation(), 2);

        // Same direction again is no change.
        apply_directions(&mut world, &keys(&[KeyCode::Up]), &mut ticker);
        assert_eq!(ticker.generation(), 2);
    }

    #[test]
    fn arrows_ignored_outside_live_play() {
        let mut world = WorldState::new(RulesConfig::default(), 0);
        let mut ticker = TickScheduler::new();
        apply_directions(&mut world, &keys(&[KeyCode::Up]), &mut ticker);
        assert!(!ticker.is_armed());
        assert_eq!(world.pending, Direction::Right);

        let (mut world, mut ticker) = started();
        handle_meta(&mut world, &keys(&[KeyCode::Char('p')]), &mut ticker);
        apply_directions(&mut world, &keys(&[KeyCode::Up]), &mut ticker);
        assert!(!ticker.is_armed());
        assert_eq!(world.pending, Direction::Right);
    }

    #[test]
    fn pause_cancels_and_resume_rearms() {
        let (mut world, mut ticker) = started();

        handle_meta(&mut world, &keys(&[KeyCode::Char('p')]), &mut ticker);
        assert!(world.paused);
        assert!(!ticker.is_armed());

        world.speed_ms = 120;
        handle_meta(&mut world, &keys(&[KeyCode::F(1)]), &mut ticker);
        assert!(!world.paused);
        assert!(ticker.is_armed());
        assert_eq!(ticker.interval(), Some(ms(120)));
        assert_eq!(ticker.generation(), 2);
    }

    #[test]
    fn esc_during_play_returns_to_title_and_cancels() {
        let (mut world, mut ticker) = started();
        handle_meta(&mut world, &keys(&[KeyCode::Char('p')]), &mut ticker);

        assert!(!handle_meta(&mut world, &keys(&[KeyCode::Esc]), &mut ticker));
        assert_eq!(world.phase, Phase::Title);
        assert!(!world.paused);
        assert!(!ticker.is_armed());
    }

    #[test]
    fn restart_from_game_over_rearms_at_base_speed() {
        let (mut world, mut ticker) = started();
        world.phase = Phase::GameOver;
        world.speed_ms = 90;
        ticker.cancel();

        handle_meta(&mut world, &keys(&[KeyCode::Char('r')]), &mut ticker);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(ticker.interval(), Some(ms(150)));
    }

    #[test]
    fn restart_keys_do_nothing_while_playing() {
        let (mut world, mut ticker) = started();
        world.score = 30;
        handle_meta(&mut world, &keys(&[KeyCode::Char('r'), KeyCode::Enter]), &mut ticker);
        assert_eq!(world.score, 30);
        assert_eq!(ticker.generation(), 1);
    }

    #[test]
    fn quit_only_from_title() {
        let mut world = WorldState::new(RulesConfig::default(), 0);
        let mut ticker = TickScheduler::new();
        assert!(handle_meta(&mut world, &keys(&[KeyCode::Char('q')]), &mut ticker));
        assert!(handle_meta(&mut world, &keys(&[KeyCode::Esc]), &mut ticker));

        let (mut world, mut ticker) = started();
        assert!(!handle_meta(&mut world, &keys(&[KeyCode::Char('q')]), &mut ticker));
        assert_eq!(world.phase, Phase::Playing);
    }
}
