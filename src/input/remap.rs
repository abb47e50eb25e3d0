//! Remap table and its publisher
//!
//! A [`RemapTable`] is built off to the side and swapped in whole through a
//! [`RemapPublisher`]. Readers grab the current `Arc` once per frame and never
//! observe a half-built table.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::code::{InputCode, MOUSE_BASE};

const UNMAPPED: u16 = u16::MAX;
const TABLE_SIZE: usize = MOUSE_BASE as usize;

/// Mapping from keyboard/joystick codes to the physical control bound to them
#[derive(Clone)]
pub struct RemapTable {
    targets: Box<[u16]>,
}

impl RemapTable {
    /// Table with every code unmapped
    pub fn new() -> Self {
        Self {
            targets: vec![UNMAPPED; TABLE_SIZE].into_boxed_slice(),
        }
    }

    pub fn get(&self, code: InputCode) -> Option<InputCode> {
        self.targets
            .get(code.raw() as usize)
            .copied()
            .filter(|target| *target != UNMAPPED)
            .map(InputCode::from_raw)
    }

    /// Binds `code` to `target`; codes outside the table are ignored
    pub fn set(&mut self, code: InputCode, target: InputCode) -> bool {
        match self.targets.get_mut(code.raw() as usize) {
            Some(slot) => {
                *slot = target.raw();
                true
            }
            None => {
                debug!("Remap source {} outside table, ignored", code);
                false
            }
        }
    }

    pub fn clear(&mut self, code: InputCode) {
        if let Some(slot) = self.targets.get_mut(code.raw() as usize) {
            *slot = UNMAPPED;
        }
    }

    pub fn mapped_count(&self) -> usize {
        self.targets.iter().filter(|t| **t != UNMAPPED).count()
    }

    /// All bindings, ordered by source code
    pub fn bindings(&self) -> impl Iterator<Item = (InputCode, InputCode)> + '_ {
        self.targets
            .iter()
            .enumerate()
            .filter(|(_, target)| **target != UNMAPPED)
            .map(|(source, target)| (InputCode::from_raw(source as u16), InputCode::from_raw(*target)))
    }
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RemapTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemapTable")
            .field("mapped", &self.mapped_count())
            .finish()
    }
}

/// Publish-by-replacement holder for the current [`RemapTable`]
#[derive(Debug)]
pub struct RemapPublisher {
    sender: watch::Sender<Arc<RemapTable>>,
}

impl RemapPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(RemapTable::new()));
        Self { sender }
    }

    /// Replaces the published table
    pub fn publish(&self, table: RemapTable) {
        debug!("Publishing remap table with {} bindings", table.mapped_count());
        self.sender.send_replace(Arc::new(table));
    }

    pub fn current(&self) -> Arc<RemapTable> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<RemapTable>> {
        self.sender.subscribe()
    }
}

impl Default for RemapPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::code::{Direction, JoystickControl};

    #[test]
    fn fresh_table_is_unmapped() {
        let table = RemapTable::new();
        assert_eq!(table.mapped_count(), 0);
        assert_eq!(table.get(InputCode::key(0xC8)), None);
    }

    #[test]
    fn set_get_and_clear() {
        let mut table = RemapTable::new();
        let up = InputCode::joystick(0, JoystickControl::Direction(Direction::Up));
        assert!(table.set(InputCode::key(0xC8), up));
        assert_eq!(table.get(InputCode::key(0xC8)), Some(up));
        table.clear(InputCode::key(0xC8));
        assert_eq!(table.get(InputCode::key(0xC8)), None);
    }

    #[test]
    fn mouse_codes_are_outside_the_table() {
        let mut table = RemapTable::new();
        assert!(!table.set(InputCode::from_raw(0x8080), InputCode::key(1)));
        assert_eq!(table.get(InputCode::from_raw(0x8080)), None);
    }

    #[test]
    fn readers_keep_their_snapshot_across_publish() {
        let publisher = RemapPublisher::new();
        let before = publisher.current();

        let mut table = RemapTable::new();
        table.set(InputCode::key(0x2C), InputCode::from_raw(0x4080));
        publisher.publish(table);

        assert_eq!(before.mapped_count(), 0);
        assert_eq!(publisher.current().mapped_count(), 1);
        assert_eq!(publisher.subscribe().borrow().mapped_count(), 1);
    }
}
