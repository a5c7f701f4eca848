//! Pointer gesture routing.
//!
//! A press is resolved against the hit index once, when it starts. Moving
//! beyond the drag threshold turns any press into a pan and cancels the
//! click; releasing without dragging activates what was pressed. Toggle
//! controls win over node bodies in the hit index, so a toggle click never
//! also issues a query.
//!
//! Every event carries the host's pointer id. A second pointer going down
//! during a press or pan starts a pinch; events from pointers the current
//! gesture does not own are ignored.

use serde::{Deserialize, Serialize};

use super::viewport::{Viewport, ViewportConfig};
use crate::spatial::{Hit, HitIndex, HitKind};

/// Pointer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    /// Screen pixels a press may move before it becomes a pan.
    pub drag_threshold: f32,
    /// Radius of the collapse/expand control in world units.
    pub toggle_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 4.0,
            toggle_radius: 9.0,
        }
    }
}

/// What a completed gesture asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum PointerAction {
    None,
    /// Flip the collapse state of a node.
    Toggle(String),
    /// Ask the insight collaborator about a node.
    Query(String),
}

/// A pointer taking part in a pinch and where it was last seen.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Contact {
    pointer_id: u32,
    at: (f32, f32),
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Pressing {
        pointer_id: u32,
        start: (f32, f32),
        last: (f32, f32),
        target: Option<Hit>,
    },
    Panning {
        pointer_id: u32,
        last: (f32, f32),
    },
    Pinching {
        contacts: [Contact; 2],
    },
}

fn midpoint(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Gesture state machine: `Idle → Pressing → Panning → Idle`, with
/// `Pinching` entered from either active state by a second pointer.
pub struct InteractionController {
    config: InteractionConfig,
    gesture: Gesture,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn pointer_down(
        &mut self,
        pointer_id: u32,
        sx: f32,
        sy: f32,
        viewport: &Viewport,
        hits: &HitIndex,
    ) {
        let held = match self.gesture {
            Gesture::Pressing {
                pointer_id: held,
                last,
                ..
            }
            | Gesture::Panning {
                pointer_id: held,
                last,
            } if held != pointer_id => Some(Contact {
                pointer_id: held,
                at: last,
            }),
            // a third finger does not change the pinch
            Gesture::Pinching { .. } => return,
            _ => None,
        };

        self.gesture = match held {
            Some(first) => Gesture::Pinching {
                contacts: [
                    first,
                    Contact {
                        pointer_id,
                        at: (sx, sy),
                    },
                ],
            },
            None => {
                let (wx, wy) = viewport.screen_to_world(sx, sy);
                Gesture::Pressing {
                    pointer_id,
                    start: (sx, sy),
                    last: (sx, sy),
                    target: hits.hit_test(wx, wy),
                }
            }
        };
    }

    pub fn pointer_move(
        &mut self,
        pointer_id: u32,
        sx: f32,
        sy: f32,
        viewport: &mut Viewport,
        config: &ViewportConfig,
    ) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Pressing {
                pointer_id: held,
                start,
                last,
                ..
            } => {
                if *held != pointer_id {
                    return;
                }
                *last = (sx, sy);
                let (dx, dy) = (sx - start.0, sy - start.1);
                if (dx * dx + dy * dy).sqrt() > self.config.drag_threshold {
                    viewport.pan_by(dx, dy);
                    self.gesture = Gesture::Panning {
                        pointer_id,
                        last: (sx, sy),
                    };
                }
            }
            Gesture::Panning {
                pointer_id: held,
                last,
            } => {
                if *held != pointer_id {
                    return;
                }
                viewport.pan_by(sx - last.0, sy - last.1);
                *last = (sx, sy);
            }
            Gesture::Pinching { contacts } => {
                let Some(index) = contacts.iter().position(|c| c.pointer_id == pointer_id) else {
                    return;
                };
                let before = (contacts[0].at, contacts[1].at);
                contacts[index].at = (sx, sy);
                let after = (contacts[0].at, contacts[1].at);

                let spread = distance(before.0, before.1);
                let ratio = if spread > f32::EPSILON {
                    distance(after.0, after.1) / spread
                } else {
                    1.0
                };
                viewport.pinch(
                    midpoint(before.0, before.1),
                    midpoint(after.0, after.1),
                    ratio,
                    config,
                );
            }
        }
    }

    /// Release a pointer. Only a press that never moved produces an action;
    /// lifting one finger of a pinch keeps panning with the other.
    pub fn pointer_up(&mut self, pointer_id: u32) -> PointerAction {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Pressing {
                pointer_id: held,
                target,
                ..
            } if held == pointer_id => match target {
                Some(hit) => match hit.kind {
                    HitKind::Toggle => PointerAction::Toggle(hit.id),
                    HitKind::Body => PointerAction::Query(hit.id),
                },
                None => PointerAction::None,
            },
            Gesture::Panning { pointer_id: held, .. } if held == pointer_id => PointerAction::None,
            Gesture::Pinching { contacts } => {
                match contacts.iter().position(|c| c.pointer_id == pointer_id) {
                    Some(index) => {
                        let rest = contacts[1 - index];
                        self.gesture = Gesture::Panning {
                            pointer_id: rest.pointer_id,
                            last: rest.at,
                        };
                    }
                    None => self.gesture = Gesture::Pinching { contacts },
                }
                PointerAction::None
            }
            // not the pointer this gesture belongs to
            other => {
                self.gesture = other;
                PointerAction::None
            }
        }
    }

    /// Abandon the current gesture (pointer left the surface).
    pub fn pointer_cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn wheel(
        &self,
        sx: f32,
        sy: f32,
        delta_y: f32,
        viewport: &mut Viewport,
        config: &ViewportConfig,
    ) {
        viewport.zoom_at(sx, sy, delta_y, config);
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}
