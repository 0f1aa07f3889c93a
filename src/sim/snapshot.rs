//! Read-only view of a frame for the renderer
//!
//! The renderer never touches `GameState`; it draws from a `Snapshot` taken
//! after the tick finished.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::particles::{Particle, ParticleColor};
use super::state::{GamePhase, GameState, MenuButton, OptionState, Player, Projectile, Star};
use crate::consts::*;

/// A meteor as the renderer sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
    pub pos: Vec2,
    pub radius: f32,
    pub label: String,
    pub state: OptionState,
    /// 1 = fully visible, fades to 0 after a pop
    pub life: f32,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub tier_name: String,
    /// e.g. "12 ÷ 3 = ?"
    pub problem_text: Option<String>,
    pub score: u64,
    pub correct_count: u32,
    pub progress_target: u32,
    /// Another tier follows the current one
    pub has_next_tier: bool,
    /// "Nice shot" banner visible
    pub nice_shot: bool,
    pub player: Player,
    pub projectiles: Vec<Projectile>,
    pub options: Vec<OptionView>,
    pub particles: Vec<Particle>,
    pub stars: Vec<Star>,
    /// Empty outside the menu
    pub menu_buttons: Vec<MenuButton>,
}

/// One drawable item, in back-to-front order
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    Star {
        pos: Vec2,
        size: f32,
    },
    Button {
        center: Vec2,
        size: Vec2,
        label: String,
    },
    Ship {
        pos: Vec2,
        size: Vec2,
    },
    Meteor {
        pos: Vec2,
        radius: f32,
        label: String,
        life: f32,
    },
    Shot {
        pos: Vec2,
        radius: f32,
    },
    Spark {
        pos: Vec2,
        size: f32,
        color: ParticleColor,
        life: f32,
    },
}

impl GameState {
    /// Capture the current frame
    pub fn snapshot(&self) -> Snapshot {
        let problem_text = match self.phase {
            GamePhase::Playing => self.question.map(|q| q.problem.to_string()),
            _ => None,
        };
        let menu_buttons = if self.phase == GamePhase::Menu {
            self.menu_buttons()
        } else {
            Vec::new()
        };

        Snapshot {
            phase: self.phase,
            tier_name: self.tier().name.clone(),
            problem_text,
            score: self.session.score,
            correct_count: self.session.correct_count,
            progress_target: self.session.progress_target,
            has_next_tier: self.has_next_tier(),
            nice_shot: self.nice_shot_ticks > 0,
            player: self.player.clone(),
            projectiles: self.projectiles.clone(),
            options: self
                .options
                .iter()
                .filter(|o| o.state != OptionState::Expired)
                .map(|o| OptionView {
                    pos: o.pos,
                    radius: o.radius,
                    label: o.value.to_string(),
                    state: o.state,
                    life: o.fade,
                })
                .collect(),
            particles: self.particles.clone(),
            stars: self.stars.clone(),
            menu_buttons,
        }
    }
}

impl Snapshot {
    /// Flatten into draw order for the current phase
    pub fn renderables(&self) -> Vec<Renderable> {
        let mut out: Vec<Renderable> = self
            .stars
            .iter()
            .map(|s| Renderable::Star {
                pos: s.pos,
                size: s.size,
            })
            .collect();

        if self.phase == GamePhase::Menu {
            out.extend(self.menu_buttons.iter().map(|b| Renderable::Button {
                center: b.center,
                size: b.size,
                label: b.label.clone(),
            }));
            return out;
        }

        // Popped meteors keep fading behind the clear screens
        out.extend(self.options.iter().map(|o| Renderable::Meteor {
            pos: o.pos,
            radius: o.radius,
            label: o.label.clone(),
            life: o.life,
        }));
        if self.phase == GamePhase::Playing {
            out.push(Renderable::Ship {
                pos: self.player.pos,
                size: Vec2::new(SHIP_WIDTH, SHIP_HEIGHT),
            });
            out.extend(self.projectiles.iter().map(|p| Renderable::Shot {
                pos: p.pos,
                radius: p.radius,
            }));
        }

        out.extend(self.particles.iter().map(|p| Renderable::Spark {
            pos: p.pos,
            size: p.size,
            color: p.color,
            life: p.life_fraction(),
        }));
        out
    }
}
