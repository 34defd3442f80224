use serde::{Deserialize, Serialize};

use crate::{Ignored, Position, PositionSource};

pub type ObjectId = u64;

/// One tappable object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TappableObject {
    pub id: ObjectId,
    /// Taps over the object's whole lifetime.
    pub total_taps: u32,
    /// Taps received during the current round.
    pub round_taps: u32,
    /// Set when a round ends without a single tap. Never cleared.
    pub busted: bool,
    pub position: Position,
}

impl TappableObject {
    fn fresh(id: ObjectId, position: Position) -> Self {
        Self {
            id,
            total_taps: 0,
            round_taps: 0,
            busted: false,
            position,
        }
    }
}

/// Result of routing one tap to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// The tap was counted and the object is still in play.
    Counted {
        id: ObjectId,
        total_taps: u32,
        round_taps: u32,
    },
    /// The tap reached the clearance threshold; the object is gone.
    Cleared { id: ObjectId },
    Ignored(Ignored),
}

impl TapOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, TapOutcome::Ignored(_))
    }
}

/// In-play objects, in spawn order.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    objects: Vec<TappableObject>,
    next_id: ObjectId,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every object and restarts id assignment.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.next_id = 0;
    }

    pub fn objects(&self) -> &[TappableObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&TappableObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects that can still be tapped.
    pub fn live_count(&self) -> usize {
        self.objects.iter().filter(|object| !object.busted).count()
    }

    pub fn busted_count(&self) -> usize {
        self.objects.len() - self.live_count()
    }

    pub fn live_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .iter()
            .filter(|object| !object.busted)
            .map(|object| object.id)
    }

    /// Appends `count` fresh objects and returns their ids.
    pub fn spawn(
        &mut self,
        count: u32,
        positions: &mut dyn PositionSource,
        range: f32,
    ) -> Vec<ObjectId> {
        let mut spawned = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = self.next_id;
            self.next_id += 1;
            let position = positions.next_position(range);
            self.objects.push(TappableObject::fresh(id, position));
            spawned.push(id);
        }
        spawned
    }

    /// Prepares surviving objects for a new round: round counters go back to
    /// zero and each one moves. Busted objects stay exactly as they are.
    pub fn rearm(&mut self, positions: &mut dyn PositionSource, range: f32) -> usize {
        let mut rearmed = 0;
        for object in self.objects.iter_mut().filter(|object| !object.busted) {
            object.round_taps = 0;
            object.position = positions.next_position(range);
            rearmed += 1;
        }
        rearmed
    }

    /// Counts one tap, removing the object once it reaches `clearance_taps`.
    pub fn tap(&mut self, id: ObjectId, clearance_taps: u32) -> TapOutcome {
        let Some(index) = self.objects.iter().position(|object| object.id == id) else {
            return TapOutcome::Ignored(Ignored::UnknownObject { id });
        };

        let object = &mut self.objects[index];
        if object.busted {
            return TapOutcome::Ignored(Ignored::AlreadyBusted { id });
        }

        object.total_taps += 1;
        object.round_taps += 1;
        if object.total_taps >= clearance_taps {
            self.objects.remove(index);
            return TapOutcome::Cleared { id };
        }

        TapOutcome::Counted {
            id,
            total_taps: object.total_taps,
            round_taps: object.round_taps,
        }
    }

    /// Busts every live object that went the whole round untapped and returns
    /// how many flipped.
    pub fn bust_untapped(&mut self) -> u32 {
        let mut busted = 0;
        for object in self
            .objects
            .iter_mut()
            .filter(|object| !object.busted && object.round_taps == 0)
        {
            object.busted = true;
            busted += 1;
        }
        busted
    }

    /// Drops objects whose lifetime taps reached `clearance_taps`.
    pub fn remove_cleared(&mut self, clearance_taps: u32) -> u32 {
        let before = self.objects.len();
        self.objects.retain(|object| object.total_taps < clearance_taps);
        (before - self.objects.len()) as u32
    }

    /// Drops every non-busted object. Used when nothing carries over.
    pub fn drop_live(&mut self) -> u32 {
        let before = self.objects.len();
        self.objects.retain(|object| object.busted);
        (before - self.objects.len()) as u32
    }
}
