//! Game state and core simulation types
//!
//! `GameState` owns the session, every live entity, the problem generator and
//! both RNG streams. Nothing outside this struct holds gameplay state.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particles::Particle;
use super::problem::{ANSWER_COUNT, Problem, ProblemGenerator, Question};
use super::tier::Tier;
use crate::clamp_to_bounds;
use crate::consts::*;
use crate::settings::{ConfigError, MenuMode, ScorePolicy, Settings};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a tier selection
    Menu,
    /// Active gameplay
    Playing,
    /// Tier finished, waiting for confirmation
    TierClear,
    /// All tiers finished, waiting for confirmation
    GameClear,
}

/// Things that happened during a tick, for audio and UI hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    TierStarted { tier_index: usize },
    QuestionSpawned { problem: Problem },
    QuestionAbandoned { problem: Problem },
    Fired { projectile_id: u32 },
    OptionPopped { value: u32, correct: bool },
    TierCleared { tier_index: usize },
    GameCleared,
    ReturnedToMenu,
    QuitRequested,
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Ship centre
    pub pos: Vec2,
    /// Ticks until the next shot is allowed
    pub cooldown_ticks: u32,
}

impl Player {
    /// Centred near the bottom of the play area
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(width / 2.0, height - SHIP_BOTTOM_OFFSET),
            cooldown_ticks: 0,
        }
    }

    /// Snap to a pointer x, keeping the hull on screen
    pub fn track(&mut self, x: f32, width: f32) {
        self.pos.x = clamp_to_bounds(x, SHIP_WIDTH / 2.0, width);
    }

    pub fn tick_cooldown(&mut self) {
        self.cooldown_ticks = self.cooldown_ticks.saturating_sub(1);
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown_ticks == 0
    }

    /// Where shots leave the ship
    pub fn nose(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - SHIP_HEIGHT / 2.0)
    }
}

/// A shot travelling up the screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Position at the start of the current tick
    #[serde(skip)]
    pub prev_pos: Vec2,
    pub radius: f32,
}

impl Projectile {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            prev_pos: pos,
            radius: PROJECTILE_RADIUS,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.prev_pos = self.pos;
        self.pos.y -= PROJECTILE_SPEED * dt;
    }

    pub fn is_offscreen(&self) -> bool {
        self.pos.y < PROJECTILE_TOP_BOUND
    }
}

/// Lifecycle of a falling answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionState {
    Falling,
    PoppedCorrect,
    PoppedWrong,
    /// Left the play area or discarded; removed at the end of the tick
    Expired,
}

/// A meteor carrying one candidate answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingOption {
    pub id: u32,
    pub pos: Vec2,
    /// Position at the start of the current tick
    #[serde(skip)]
    pub prev_pos: Vec2,
    pub value: u32,
    /// Pixels per second
    pub fall_speed: f32,
    pub radius: f32,
    pub state: OptionState,
    /// Exit animation progress, 1 = opaque
    pub fade: f32,
}

impl FallingOption {
    pub fn new(id: u32, pos: Vec2, value: u32, fall_speed: f32) -> Self {
        Self {
            id,
            pos,
            prev_pos: pos,
            value,
            fall_speed,
            radius: OPTION_RADIUS,
            state: OptionState::Falling,
            fade: 1.0,
        }
    }

    /// Advance one tick; returns true if the meteor just fell out of the play area
    pub fn update(&mut self, dt: f32, height: f32) -> bool {
        self.prev_pos = self.pos;
        match self.state {
            OptionState::Falling => {
                self.pos.y += self.fall_speed * dt;
                if self.pos.y - self.radius > height {
                    self.state = OptionState::Expired;
                    return true;
                }
            }
            OptionState::PoppedCorrect | OptionState::PoppedWrong => self.fade_out(dt),
            OptionState::Expired => {}
        }
        false
    }

    pub fn fade_out(&mut self, dt: f32) {
        if self.is_popped() {
            self.fade = (self.fade - dt / POP_FADE_SECS).max(0.0);
        }
    }

    pub fn pop(&mut self, correct: bool) {
        self.state = if correct {
            OptionState::PoppedCorrect
        } else {
            OptionState::PoppedWrong
        };
    }

    pub fn is_falling(&self) -> bool {
        self.state == OptionState::Falling
    }

    pub fn is_popped(&self) -> bool {
        matches!(
            self.state,
            OptionState::PoppedCorrect | OptionState::PoppedWrong
        )
    }

    /// Ready to be dropped from the live set
    pub fn is_finished(&self) -> bool {
        match self.state {
            OptionState::Expired => true,
            OptionState::PoppedCorrect | OptionState::PoppedWrong => self.fade <= 0.0,
            OptionState::Falling => false,
        }
    }
}

/// Background star
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    /// Pixels per second
    pub speed: f32,
    pub size: f32,
}

impl Star {
    /// Scatter across (and above) the play area
    pub fn spawn<R: Rng>(rng: &mut R, width: f32, height: f32) -> Self {
        let mut star = Self {
            pos: Vec2::ZERO,
            speed: 0.0,
            size: 0.0,
        };
        star.respawn(rng, width, -height, height);
        star
    }

    fn respawn<R: Rng>(&mut self, rng: &mut R, width: f32, y_min: f32, y_max: f32) {
        self.pos = Vec2::new(rng.random_range(0.0..width), rng.random_range(y_min..y_max));
        self.speed = rng.random_range(0.5..=2.5) * FPS;
        self.size = rng.random_range(1..=3) as f32;
    }

    pub fn update<R: Rng>(&mut self, rng: &mut R, dt: f32, width: f32, height: f32) {
        self.pos.y += self.speed * dt;
        if self.pos.y > height {
            self.respawn(rng, width, -100.0, 0.0);
        }
    }
}

/// A clickable tier button on the menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuButton {
    pub tier_index: usize,
    pub label: String,
    pub center: Vec2,
    pub size: Vec2,
}

impl MenuButton {
    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size / 2.0;
        (point.x - self.center.x).abs() <= half.x && (point.y - self.center.y).abs() <= half.y
    }
}

/// Per-run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub tier_index: usize,
    pub score: u64,
    pub correct_count: u32,
    /// Correct answers needed to clear the tier
    pub progress_target: u32,
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    pub session: Session,
    pub player: Player,
    /// Latest pointer position reported by the host
    pub pointer: Option<Vec2>,
    /// Question on screen; `None` while a new one is due
    pub question: Option<Question>,
    /// Live shots (ascending id)
    pub projectiles: Vec<Projectile>,
    /// Live meteors (ascending id)
    pub options: Vec<FallingOption>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub stars: Vec<Star>,
    /// Ticks left on the "nice shot" banner
    pub nice_shot_ticks: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Set once Quit or Cancel arrives; the host should stop its loop
    pub quit_requested: bool,
    /// Events raised during the last tick
    pub events: Vec<GameEvent>,
    settings: Settings,
    problems: ProblemGenerator,
    /// Meteor layout and speeds
    layout_rng: Pcg32,
    /// Particles and stars
    pub(crate) fx_rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Validate `settings` and build a state sitting on the menu
    pub fn new(settings: Settings, seed: u64) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut fx_rng = Pcg32::new(seed, 0xfeed);
        let stars = (0..settings.star_count)
            .map(|_| Star::spawn(&mut fx_rng, settings.width, settings.height))
            .collect();

        Ok(Self {
            seed,
            phase: GamePhase::Menu,
            session: Session {
                tier_index: 0,
                score: 0,
                correct_count: 0,
                progress_target: settings.progress_target,
            },
            player: Player::new(settings.width, settings.height),
            pointer: None,
            question: None,
            projectiles: Vec::new(),
            options: Vec::new(),
            particles: Vec::new(),
            stars,
            nice_shot_ticks: 0,
            time_ticks: 0,
            quit_requested: false,
            events: Vec::new(),
            problems: ProblemGenerator::new(seed),
            layout_rng: Pcg32::seed_from_u64(seed),
            fx_rng,
            next_id: 1,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tier(&self) -> &Tier {
        &self.settings.tiers[self.session.tier_index]
    }

    pub fn has_next_tier(&self) -> bool {
        self.session.tier_index + 1 < self.settings.tiers.len()
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Buttons shown on the menu
    pub fn menu_buttons(&self) -> Vec<MenuButton> {
        let size = Vec2::new(MENU_BUTTON_WIDTH, MENU_BUTTON_HEIGHT);
        let center = Vec2::new(self.settings.width / 2.0, self.settings.height / 2.0);
        match self.settings.menu_mode {
            MenuMode::TierButtons => self
                .settings
                .tiers
                .iter()
                .enumerate()
                .map(|(i, tier)| MenuButton {
                    tier_index: i,
                    label: tier.name.clone(),
                    center: center + Vec2::new(0.0, i as f32 * MENU_BUTTON_SPACING),
                    size,
                })
                .collect(),
            MenuMode::SingleStart => vec![MenuButton {
                tier_index: 0,
                label: "Start".to_string(),
                center,
                size,
            }],
        }
    }

    /// Clear entities and per-tier counters for the current tier
    fn reset_for_tier(&mut self) {
        self.player = Player::new(self.settings.width, self.settings.height);
        if let Some(pointer) = self.pointer {
            self.player.track(pointer.x, self.settings.width);
        }
        self.projectiles.clear();
        self.options.clear();
        self.particles.clear();
        self.question = None;
        self.nice_shot_ticks = 0;
        self.session.correct_count = 0;
        self.session.progress_target = self.settings.progress_target;
    }

    fn begin_tier(&mut self) {
        self.reset_for_tier();
        self.phase = GamePhase::Playing;
        log::info!(
            "Tier {} ({}) started, score {}",
            self.session.tier_index,
            self.tier().name,
            self.session.score
        );
        self.events.push(GameEvent::TierStarted {
            tier_index: self.session.tier_index,
        });
        self.spawn_question();
    }

    /// Start a fresh run on `tier_index` (menu selection)
    pub fn select_tier(&mut self, tier_index: usize) {
        if self.phase != GamePhase::Menu || tier_index >= self.settings.tiers.len() {
            return;
        }
        self.session.tier_index = tier_index;
        self.session.score = 0;
        self.begin_tier();
    }

    /// Confirm the tier-clear screen
    pub fn confirm_tier_clear(&mut self) {
        if self.phase != GamePhase::TierClear {
            return;
        }
        if self.has_next_tier() {
            self.session.tier_index += 1;
            if self.settings.score_policy == ScorePolicy::ResetPerTier {
                self.session.score = 0;
            }
            self.begin_tier();
        } else {
            self.phase = GamePhase::GameClear;
            log::info!("All tiers cleared, final score {}", self.session.score);
            self.events.push(GameEvent::GameCleared);
        }
    }

    /// Confirm the game-clear screen
    pub fn return_to_menu(&mut self) {
        if self.phase != GamePhase::GameClear {
            return;
        }
        self.phase = GamePhase::Menu;
        self.session.tier_index = 0;
        self.session.score = 0;
        self.reset_for_tier();
        log::info!("Back to menu");
        self.events.push(GameEvent::ReturnedToMenu);
    }

    /// Put a new problem on screen
    ///
    /// Meteors still falling from the previous question are discarded;
    /// popped ones keep fading.
    pub fn spawn_question(&mut self) {
        let question = match self.problems.next_question(&self.settings.tiers[self.session.tier_index]) {
            Ok(question) => question,
            Err(err) => {
                log::error!("Could not generate a question: {}", err);
                return;
            }
        };

        self.options.retain(FallingOption::is_popped);

        let mut columns: [f32; ANSWER_COUNT] =
            std::array::from_fn(|k| self.settings.width * (k + 1) as f32 / (ANSWER_COUNT + 1) as f32);
        columns.shuffle(&mut self.layout_rng);

        let (speed_min, speed_max) = {
            let tier = self.tier();
            (tier.fall_speed_min, tier.fall_speed_max)
        };
        for (x, value) in columns.into_iter().zip(question.answers.iter()) {
            let id = self.next_entity_id();
            let speed = self.layout_rng.random_range(speed_min..=speed_max);
            self.options
                .push(FallingOption::new(id, Vec2::new(x, OPTION_SPAWN_Y), value, speed));
        }

        log::debug!(
            "Question {} options {:?}",
            question.problem,
            question.answers.values()
        );
        self.events.push(GameEvent::QuestionSpawned {
            problem: question.problem,
        });
        self.question = Some(question);
    }

    /// Drop the current question without penalty
    pub fn abandon_question(&mut self) {
        if let Some(question) = self.question.take() {
            log::debug!("Question {} abandoned", question.problem);
            self.events.push(GameEvent::QuestionAbandoned {
                problem: question.problem,
            });
        }
    }

    /// Fire if the rules allow it; returns whether a shot left the ship
    pub fn try_fire(&mut self) -> bool {
        if self.phase != GamePhase::Playing
            || self.question.is_none()
            || !self.player.can_fire()
            || self.projectiles.len() >= self.settings.projectile_policy.capacity()
        {
            return false;
        }
        let id = self.next_entity_id();
        self.projectiles.push(Projectile::new(id, self.player.nose()));
        self.player.cooldown_ticks = self.settings.fire_cooldown_ticks;
        self.events.push(GameEvent::Fired { projectile_id: id });
        true
    }
}
