//! Bank/program catalog
//!
//! A two-level registry: banks keyed by id, each owning programs keyed by
//! id. Ids are caller supplied; adding an existing id replaces the old
//! entry. Iteration is always in ascending id order.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A named program inside a bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    id: u16,
    name: String,
}

impl Program {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// A named, ordered collection of programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    id: u16,
    name: String,
    progs: BTreeMap<u16, Program>,
}

impl Bank {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            progs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add (or replace) program `id`
    pub fn add_prog(&mut self, id: u16, name: impl Into<String>) -> &mut Program {
        let prog = Program::new(id, name);
        match self.progs.entry(id) {
            Entry::Occupied(mut e) => {
                e.insert(prog);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(prog),
        }
    }

    pub fn prog(&self, id: u16) -> Option<&Program> {
        self.progs.get(&id)
    }

    pub fn remove_prog(&mut self, id: u16) -> Option<Program> {
        self.progs.remove(&id)
    }

    /// Programs in ascending id order
    pub fn progs(&self) -> impl Iterator<Item = &Program> {
        self.progs.values()
    }

    pub fn len(&self) -> usize {
        self.progs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progs.is_empty()
    }
}

/// Complete bank/program catalog with an optional current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Programs {
    banks: BTreeMap<u16, Bank>,
    selected: Option<(u16, u16)>,
}

impl Programs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) bank `id`, dropping any programs it had
    pub fn add_bank(&mut self, id: u16, name: impl Into<String>) -> &mut Bank {
        let bank = Bank::new(id, name);
        match self.banks.entry(id) {
            Entry::Occupied(mut e) => {
                e.insert(bank);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(bank),
        }
    }

    pub fn bank(&self, id: u16) -> Option<&Bank> {
        self.banks.get(&id)
    }

    pub fn bank_mut(&mut self, id: u16) -> Option<&mut Bank> {
        self.banks.get_mut(&id)
    }

    pub fn remove_bank(&mut self, id: u16) -> Option<Bank> {
        if matches!(self.selected, Some((bank, _)) if bank == id) {
            self.selected = None;
        }
        self.banks.remove(&id)
    }

    /// Banks in ascending id order
    pub fn banks(&self) -> impl Iterator<Item = &Bank> {
        self.banks.values()
    }

    pub fn clear_banks(&mut self) {
        self.banks.clear();
        self.selected = None;
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Select a program; returns it when both bank and program exist
    pub fn select_program(&mut self, bank_id: u16, prog_id: u16) -> Option<&Program> {
        let prog = self.banks.get(&bank_id)?.prog(prog_id)?;
        self.selected = Some((bank_id, prog_id));
        Some(prog)
    }

    /// Currently selected `(bank, program)`, if it still exists
    pub fn current(&self) -> Option<(&Bank, &Program)> {
        let (bank_id, prog_id) = self.selected?;
        let bank = self.banks.get(&bank_id)?;
        Some((bank, bank.prog(prog_id)?))
    }
}
