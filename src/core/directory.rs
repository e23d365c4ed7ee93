//! Purpose: Ordered table slots of one dataset with lazy load and eviction.
//! Exports: `TableDirectory`, `SlotState`.
//! Role: Owns the dataset stream and every materialized `Table`.
//! Invariants: Each slot keeps (name, offset) forever; only its state changes.
//! Invariants: A slot becomes Loaded only after a complete, successful decode.
//! Invariants: Name lookups follow the reader's case policy, same as columns.
use std::io::{Read, Seek};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::column::fold_name;
use crate::core::decode::{DecodeContext, decode_table};
use crate::core::error::{Error, ErrorKind};
use crate::core::table::Table;

#[derive(Debug)]
pub enum SlotState {
    Unloaded,
    Loaded(Box<Table>),
}

#[derive(Debug)]
struct TableSlot {
    name: Rc<str>,
    offset: u64,
    state: SlotState,
}

pub struct TableDirectory<R> {
    source: R,
    stream_len: u64,
    context: DecodeContext,
    slots: Vec<TableSlot>,
    by_name: FxHashMap<String, usize>,
}

impl<R: Read + Seek> TableDirectory<R> {
    pub(crate) fn new(
        source: R,
        stream_len: u64,
        context: DecodeContext,
        entries: Vec<(Rc<str>, u64)>,
    ) -> Self {
        let mut by_name = FxHashMap::default();
        let slots = entries
            .into_iter()
            .enumerate()
            .map(|(slot, (name, offset))| {
                by_name
                    .entry(fold_name(&name, context.case_sensitive).into_owned())
                    .or_insert(slot);
                TableSlot {
                    name,
                    offset,
                    state: SlotState::Unloaded,
                }
            })
            .collect();
        Self {
            source,
            stream_len,
            context,
            slots,
            by_name,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.slots.iter().map(|slot| &*slot.name)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| &*slot.name)
    }

    pub fn offset_at(&self, index: usize) -> Option<u64> {
        self.slots.get(index).map(|slot| slot.offset)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name
            .get(&*fold_name(name, self.context.case_sensitive))
            .copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.get_loaded(name).is_some()
    }

    pub fn state_at(&self, index: usize) -> Option<&SlotState> {
        self.slots.get(index).map(|slot| &slot.state)
    }

    /// The table under `name` if it is already materialized; never decodes.
    pub fn get_loaded(&self, name: &str) -> Option<&Table> {
        let slot = self.slots.get(self.position(name)?)?;
        match &slot.state {
            SlotState::Loaded(table) => Some(&**table),
            SlotState::Unloaded => None,
        }
    }

    /// Every materialized table in slot order.
    pub fn loaded(&self) -> impl Iterator<Item = &Table> + '_ {
        self.slots.iter().filter_map(|slot| match &slot.state {
            SlotState::Loaded(table) => Some(&**table),
            SlotState::Unloaded => None,
        })
    }

    pub fn table(&mut self, name: &str) -> Result<&Table, Error> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::key_not_found(name, "tables"))?;
        self.table_at(index)
    }

    /// Returns the table in `index`, decoding it first when the slot is Unloaded.
    pub fn table_at(&mut self, index: usize) -> Result<&Table, Error> {
        self.ensure_loaded(index)?;
        match &self.slots[index].state {
            SlotState::Loaded(table) => Ok(&**table),
            SlotState::Unloaded => Err(Error::new(ErrorKind::Internal)
                .with_message("slot unloaded after successful decode")),
        }
    }

    pub fn load(&mut self, name: &str) -> Result<(), Error> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::key_not_found(name, "tables"))?;
        self.ensure_loaded(index)
    }

    pub fn load_all(&mut self) -> Result<(), Error> {
        for index in 0..self.slots.len() {
            self.ensure_loaded(index)?;
        }
        Ok(())
    }

    /// Drops a loaded table and returns its slot to Unloaded. Unknown names and
    /// already-unloaded slots are left alone.
    pub fn release(&mut self, name: &str) {
        let Some(index) = self.position(name) else {
            return;
        };
        let slot = &mut self.slots[index];
        if let SlotState::Loaded(_) = slot.state {
            slot.state = SlotState::Unloaded;
            tracing::debug!(table = %slot.name, slot = index, "released table");
        }
    }

    pub fn release_all(&mut self) {
        for slot in &mut self.slots {
            slot.state = SlotState::Unloaded;
        }
    }

    fn ensure_loaded(&mut self, index: usize) -> Result<(), Error> {
        let slot = self
            .slots
            .get(index)
            .ok_or_else(|| Error::key_not_found(index, "tables"))?;
        if let SlotState::Loaded(_) = slot.state {
            return Ok(());
        }
        let name = Rc::clone(&slot.name);
        let table = decode_table(
            &mut self.source,
            self.stream_len,
            index,
            slot.offset,
            &self.context,
        )
        .map_err(|err| err.with_table(name.to_string()))?;
        self.slots[index].state = SlotState::Loaded(Box::new(table));
        Ok(())
    }
}
