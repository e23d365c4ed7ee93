//! Purpose: Intern every text id of a dataset in one pool shared by all open readers.
//! Exports: `TextId`, `PoolHandle`, `StringPool`, `PrimeStats`.
//! Role: Resolves TextIds for headers, column names, and string fields.
//! Invariants: First writer wins; a known id is never overwritten, only skipped.
//! Invariants: The pool is cleared exactly when the last `PoolHandle` drops.
//! Invariants: Thread-local and `!Send`: every reader sharing a pool lives on one thread.
use std::cell::RefCell;
use std::io::{Read, Seek};
use std::marker::PhantomData;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::error::Error;
use crate::core::wire::StreamCursor;

pub type TextId = i32;

pub const EMPTY_TEXT_ID: TextId = 0;

#[derive(Default)]
struct PoolState {
    refs: usize,
    strings: FxHashMap<TextId, Rc<str>>,
}

thread_local! {
    static POOL: RefCell<PoolState> = RefCell::new(PoolState::default());
    static EMPTY: Rc<str> = Rc::from("");
}

/// Observers for the shared pool; used by diagnostics and tests.
pub struct StringPool;

impl StringPool {
    pub fn ref_count() -> usize {
        POOL.with(|pool| pool.borrow().refs)
    }

    pub fn len() -> usize {
        POOL.with(|pool| pool.borrow().strings.len())
    }

    pub fn is_empty() -> bool {
        Self::len() == 0
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PrimeStats {
    pub inserted: usize,
    pub skipped: usize,
}

/// One reference tick on the shared pool. Lookups go through a handle so the
/// pool cannot be read while no reader holds it open.
#[derive(Debug)]
pub struct PoolHandle {
    _not_send: PhantomData<Rc<()>>,
}

impl PoolHandle {
    pub fn acquire() -> Self {
        POOL.with(|pool| pool.borrow_mut().refs += 1);
        Self {
            _not_send: PhantomData,
        }
    }

    pub fn get(&self, id: TextId) -> Result<Rc<str>, Error> {
        if id == EMPTY_TEXT_ID {
            return Ok(EMPTY.with(Rc::clone));
        }
        POOL.with(|pool| pool.borrow().strings.get(&id).cloned())
            .ok_or_else(|| Error::corrupt(format!("unknown text id {id}")))
    }

    pub fn contains(&self, id: TextId) -> bool {
        id == EMPTY_TEXT_ID || POOL.with(|pool| pool.borrow().strings.contains_key(&id))
    }

    /// Inserts `text` under `id` unless the id is already known. Returns whether
    /// the pool changed.
    pub fn insert(&self, id: TextId, text: &str) -> bool {
        if id == EMPTY_TEXT_ID {
            return false;
        }
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.strings.contains_key(&id) {
                return false;
            }
            pool.strings.insert(id, Rc::from(text));
            true
        })
    }

    /// Reads one string-resource block at the cursor and interns its entries.
    pub(crate) fn prime<R: Read + Seek>(
        &self,
        cursor: &mut StreamCursor<'_, R>,
    ) -> Result<PrimeStats, Error> {
        let start = cursor.position();
        let count = cursor.read_len("string count")?;
        let mut stats = PrimeStats::default();
        for _ in 0..count {
            let id = cursor.read_i32()?;
            let len = cursor.read_len("string length")?;
            if self.contains(id) {
                cursor.skip(len as u64)?;
                stats.skipped += 1;
                continue;
            }
            let at = cursor.position();
            let bytes = cursor.read_vec(len)?;
            let text = String::from_utf8(bytes).map_err(|err| {
                Error::corrupt(format!("text id {id} is not valid UTF-8"))
                    .with_offset(at)
                    .with_source(err)
            })?;
            self.insert(id, &text);
            stats.inserted += 1;
        }
        tracing::trace!(
            offset = start,
            inserted = stats.inserted,
            skipped = stats.skipped,
            "primed string block"
        );
        Ok(stats)
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            pool.refs = pool.refs.saturating_sub(1);
            if pool.refs == 0 {
                pool.strings.clear();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{PoolHandle, StringPool};
    use crate::core::error::ErrorKind;
    use crate::core::wire::StreamCursor;
    use std::io::Cursor;

    fn block(entries: &[(i32, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(entries.len() as i32).to_le_bytes());
        for (id, text) in entries {
            buf.extend_from_slice(&id.to_le_bytes());
            buf.extend_from_slice(&(text.len() as i32).to_le_bytes());
            buf.extend_from_slice(text.as_bytes());
        }
        buf
    }

    fn prime(pool: &PoolHandle, bytes: Vec<u8>) -> u64 {
        let len = bytes.len() as u64;
        let mut stream = Cursor::new(bytes);
        let mut cursor = StreamCursor::new(&mut stream, len);
        pool.prime(&mut cursor).expect("prime");
        cursor.position()
    }

    #[test]
    fn first_writer_wins_and_cursor_stays_aligned() {
        let pool = PoolHandle::acquire();
        prime(&pool, block(&[(10, "sword"), (11, "")]));
        let before = StringPool::len();

        let mut bytes = block(&[(10, "shield"), (12, "bow")]);
        let total = bytes.len() as u64;
        bytes.extend_from_slice(b"trailing");
        let end = prime(&pool, bytes);

        assert_eq!(end, total);
        assert_eq!(&*pool.get(10).expect("get"), "sword");
        assert_eq!(&*pool.get(12).expect("get"), "bow");
        assert_eq!(&*pool.get(11).expect("get"), "");
        assert_eq!(StringPool::len(), before + 1);
    }

    #[test]
    fn zero_id_is_empty_and_never_stored() {
        let pool = PoolHandle::acquire();
        prime(&pool, block(&[(0, "ignored")]));
        assert_eq!(&*pool.get(0).expect("empty"), "");
        assert!(!pool.insert(0, "nope"));
    }

    #[test]
    fn unknown_id_is_corrupt() {
        let pool = PoolHandle::acquire();
        let err = pool.get(424_242).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let pool = PoolHandle::acquire();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&77i32.to_le_bytes());
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let len = bytes.len() as u64;
        let mut stream = Cursor::new(bytes);
        let mut cursor = StreamCursor::new(&mut stream, len);
        let err = pool.prime(&mut cursor).expect_err("bad utf8");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn pool_clears_when_last_handle_drops() {
        let base = StringPool::ref_count();
        let first = PoolHandle::acquire();
        let second = PoolHandle::acquire();
        first.insert(5, "kept");
        assert_eq!(StringPool::ref_count(), base + 2);

        drop(first);
        assert_eq!(&*second.get(5).expect("still interned"), "kept");

        let survivor = second.get(5).expect("value");
        drop(second);
        assert_eq!(StringPool::ref_count(), base);
        if base == 0 {
            assert!(StringPool::is_empty());
        }
        assert_eq!(&*survivor, "kept");
    }
}
