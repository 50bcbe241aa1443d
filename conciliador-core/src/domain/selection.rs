//! Selection registry - which movements the user has ticked, per origin
//!
//! The registry is a transient cache of user intent for one loaded
//! reconciliation. The server stays the source of truth; the registry is
//! rebuilt from scratch every time the detail is (re)loaded.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::movement::{Movement, Origin};
use super::result::Result;

/// Read-only lookup of the movements rendered for one origin
#[derive(Debug, Clone, Default)]
pub struct MovementLookup {
    /// Ids in the order the server listed them
    order: Vec<i64>,
    by_id: HashMap<i64, Movement>,
}

impl MovementLookup {
    pub fn new(movements: impl IntoIterator<Item = Movement>) -> Self {
        let mut lookup = Self::default();
        for movement in movements {
            // First occurrence wins; the server never repeats ids within a list
            if !lookup.by_id.contains_key(&movement.id) {
                lookup.order.push(movement.id);
                lookup.by_id.insert(movement.id, movement);
            }
        }
        lookup
    }

    pub fn get(&self, id: i64) -> Option<&Movement> {
        self.by_id.get(&id)
    }

    /// Ids in rendering order
    pub fn ids(&self) -> &[i64] {
        &self.order
    }

    /// Movements in rendering order
    pub fn iter(&self) -> impl Iterator<Item = &Movement> {
        self.order.iter().filter_map(move |id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Snapshot of both selection sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selections {
    pub banco: Vec<i64>,
    pub auxiliar: Vec<i64>,
}

impl Selections {
    pub fn for_origin(&self, origin: Origin) -> &[i64] {
        match origin {
            Origin::Banco => &self.banco,
            Origin::Auxiliar => &self.auxiliar,
        }
    }
}

/// Tracks the checked movement ids of the bank and ledger lists
#[derive(Debug, Clone, Default)]
pub struct SelectionRegistry {
    bank: BTreeSet<i64>,
    ledger: BTreeSet<i64>,
    bank_lookup: MovementLookup,
    ledger_lookup: MovementLookup,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both lookup tables and clear both selections
    pub fn init(&mut self, bank_lookup: MovementLookup, ledger_lookup: MovementLookup) {
        self.bank_lookup = bank_lookup;
        self.ledger_lookup = ledger_lookup;
        self.bank.clear();
        self.ledger.clear();
    }

    fn set_mut(&mut self, origin: Origin) -> &mut BTreeSet<i64> {
        match origin {
            Origin::Banco => &mut self.bank,
            Origin::Auxiliar => &mut self.ledger,
        }
    }

    /// Check or uncheck one movement. Repeating the same call is a no-op.
    pub fn toggle(&mut self, origin: Origin, id: i64, checked: bool) {
        let set = self.set_mut(origin);
        if checked {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    /// Like [`toggle`](Self::toggle), with the origin given as its wire tag.
    ///
    /// Unrecognized tags are rejected and leave both sets untouched.
    pub fn toggle_tagged(&mut self, tag: &str, id: i64, checked: bool) -> Result<()> {
        let origin: Origin = tag.parse()?;
        self.toggle(origin, id, checked);
        Ok(())
    }

    /// Apply `checked` to every rendered movement of `origin`.
    ///
    /// Afterwards the set holds exactly the rendered ids (or nothing),
    /// whatever it held before.
    pub fn select_all(&mut self, origin: Origin, checked: bool) {
        let rendered: Vec<i64> = self.lookup(origin).ids().to_vec();
        self.set_mut(origin).clear();
        if checked {
            for id in rendered {
                self.toggle(origin, id, true);
            }
        }
    }

    /// Snapshot of both sets, ids ascending
    pub fn selections(&self) -> Selections {
        Selections {
            banco: self.bank.iter().copied().collect(),
            auxiliar: self.ledger.iter().copied().collect(),
        }
    }

    pub fn is_selected(&self, origin: Origin, id: i64) -> bool {
        match origin {
            Origin::Banco => self.bank.contains(&id),
            Origin::Auxiliar => self.ledger.contains(&id),
        }
    }

    pub fn lookup(&self, origin: Origin) -> &MovementLookup {
        match origin {
            Origin::Banco => &self.bank_lookup,
            Origin::Auxiliar => &self.ledger_lookup,
        }
    }

    pub fn movement(&self, origin: Origin, id: i64) -> Option<&Movement> {
        self.lookup(origin).get(id)
    }

    /// Ids of `origin` in display order
    pub fn rendered(&self, origin: Origin) -> &[i64] {
        self.lookup(origin).ids()
    }
}
