//! Frame-sampled interpolation tasks.
//!
//! Key properties:
//! - At most one task per `TweenKey`; starting a task cancels whatever was in
//!   flight on the same key (cancel-and-replace).
//! - Tasks do nothing until their delay elapses; samples are produced on each
//!   `advance` once started and the final sample lands exactly on `to`.
//! - `advance` yields samples in ascending `(key, id)` order.

use foundation::math::Vec3;
use foundation::time::Time;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TweenProperty {
    Position,
}

/// Identity of an animated value: which object, which property.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenKey {
    pub target: u64,
    pub property: TweenProperty,
}

impl TweenKey {
    pub fn position(target: u64) -> Self {
        Self {
            target,
            property: TweenProperty::Position,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let k = -2.0 * t + 2.0;
                    1.0 - k * k * k / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween {
    pub from: Vec3,
    pub to: Vec3,
    /// Delay before interpolation begins (seconds).
    pub delay_s: f64,
    pub duration_s: f64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3) -> Self {
        Self {
            from,
            to,
            delay_s: 0.0,
            duration_s: 1.0,
            easing: Easing::default(),
        }
    }

    pub fn delayed(mut self, delay_s: f64) -> Self {
        self.delay_s = delay_s.max(0.0);
        self
    }

    pub fn lasting(mut self, duration_s: f64) -> Self {
        self.duration_s = duration_s.max(0.0);
        self
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    fn value_at(&self, elapsed_s: f64) -> (Vec3, bool) {
        if self.duration_s <= 0.0 || elapsed_s >= self.duration_s {
            return (self.to, true);
        }
        let k = self.easing.apply(elapsed_s / self.duration_s);
        (self.from.lerp(self.to, k), false)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TweenSample {
    pub id: TweenId,
    pub key: TweenKey,
    pub value: Vec3,
    pub finished: bool,
}

#[derive(Debug, Clone)]
struct Task {
    id: TweenId,
    key: TweenKey,
    tween: Tween,
    scheduled_at: Time,
}

impl Task {
    fn begins_at(&self) -> Time {
        self.scheduled_at.offset(self.tween.delay_s)
    }
}

#[derive(Debug, Default)]
pub struct Animator {
    next_id: u64,
    tasks: Vec<Task>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `tween` on `key` at `now`, replacing any task already on `key`.
    pub fn start(&mut self, key: TweenKey, tween: Tween, now: Time) -> TweenId {
        self.cancel(key);
        let id = TweenId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.push(Task {
            id,
            key,
            tween,
            scheduled_at: now,
        });
        id
    }

    pub fn cancel(&mut self, key: TweenKey) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.key != key);
        before != self.tasks.len()
    }

    /// Cancels every property task on `target`. Returns the number removed.
    pub fn cancel_target(&mut self, target: u64) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.key.target != target);
        before - self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_animating(&self, target: u64) -> bool {
        self.tasks.iter().any(|t| t.key.target == target)
    }

    /// Target value of the task on `key`, if one is in flight.
    pub fn destination(&self, key: TweenKey) -> Option<Vec3> {
        self.tasks
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.tween.to)
    }

    /// Samples every started task at `now` and retires the finished ones.
    pub fn advance(&mut self, now: Time) -> Vec<TweenSample> {
        let mut out = Vec::new();
        for task in &self.tasks {
            let begins = task.begins_at();
            if now < begins {
                continue;
            }
            let (value, finished) = task.tween.value_at(now.since(begins));
            out.push(TweenSample {
                id: task.id,
                key: task.key,
                value,
                finished,
            });
        }

        self.tasks.retain(|t| {
            !out
                .iter()
                .any(|s| s.finished && s.id == t.id)
        });

        out.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.id.cmp(&b.id)));
        out
    }
}
