//! Purpose: Entry point that opens a dataset stream and exposes its identity and tables.
//! Exports: `DatasetReader`, `ReadFlags`.
//! Role: Decodes the file header, primes global strings, and builds the directory.
//! Invariants: Each reader holds exactly one reference on the string pool.
//! Invariants: Eager readers decode every table before `open` returns.
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::rc::Rc;

use memmap2::Mmap;

use crate::core::decode::DecodeContext;
use crate::core::directory::TableDirectory;
use crate::core::error::{Error, ErrorKind};
use crate::core::header::{FileHeader, TableIndexEntry};
use crate::core::keys::{KeyHasher, default_key_hash};
use crate::core::strings::PoolHandle;
use crate::core::table::Table;
use crate::core::wire::{StreamCursor, stream_len};

#[derive(Clone, Copy, Debug)]
pub struct ReadFlags {
    lazy: bool,
    case_sensitive: bool,
    key_hasher: KeyHasher,
}

impl Default for ReadFlags {
    fn default() -> Self {
        Self {
            lazy: false,
            case_sensitive: false,
            key_hasher: default_key_hash,
        }
    }
}

impl ReadFlags {
    pub const LAZY: u32 = 1;
    pub const CASE_SENSITIVE: u32 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the numeric flag word used by other readers of this format.
    pub fn from_bits(bits: u32) -> Self {
        Self::default()
            .lazy(bits & Self::LAZY != 0)
            .case_sensitive(bits & Self::CASE_SENSITIVE != 0)
    }

    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.lazy {
            bits |= Self::LAZY;
        }
        if self.case_sensitive {
            bits |= Self::CASE_SENSITIVE;
        }
        bits
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_key_hasher(mut self, hasher: KeyHasher) -> Self {
        self.key_hasher = hasher;
        self
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

pub struct DatasetReader<R> {
    header: FileHeader,
    flags: ReadFlags,
    name: Rc<str>,
    revision: Rc<str>,
    types_hash: Rc<str>,
    tables_hash: Rc<str>,
    tags: Rc<str>,
    tables: TableDirectory<R>,
    _pool: Rc<PoolHandle>,
}

impl<R: Read + Seek> DatasetReader<R> {
    pub fn open(mut stream: R, flags: ReadFlags) -> Result<Self, Error> {
        let pool = Rc::new(PoolHandle::acquire());
        let len = stream_len(&mut stream)?;
        let mut cursor = StreamCursor::new(&mut stream, len);

        let header = FileHeader::read(&mut cursor)?;
        header.validate(len)?;

        cursor.seek_to(header.index_start())?;
        let mut entries = Vec::with_capacity(header.table_count as usize);
        for _ in 0..header.table_count {
            entries.push(TableIndexEntry::read(&mut cursor)?);
        }

        cursor.seek_to(header.string_resources_offset as u64)?;
        let stats = pool.prime(&mut cursor)?;

        let mut slots = Vec::with_capacity(entries.len());
        for entry in &entries {
            if entry.offset < 0 || entry.offset as u64 > len {
                return Err(Error::corrupt(format!(
                    "table offset out of range: {}",
                    entry.offset
                )));
            }
            slots.push((pool.get(entry.table_name)?, entry.offset as u64));
        }

        let name = pool.get(header.name)?;
        let mut reader = Self {
            header,
            flags,
            revision: pool.get(header.revision)?,
            types_hash: pool.get(header.types_hash)?,
            tables_hash: pool.get(header.tables_hash)?,
            tags: pool.get(header.tags)?,
            name,
            tables: TableDirectory::new(
                stream,
                len,
                DecodeContext {
                    file_magic: header.magic,
                    case_sensitive: flags.is_case_sensitive(),
                    key_hasher: flags.key_hasher,
                    pool: Rc::clone(&pool),
                },
                slots,
            ),
            _pool: pool,
        };
        tracing::debug!(
            dataset = %reader.name,
            tables = reader.tables.len(),
            strings = stats.inserted,
            lazy = flags.is_lazy(),
            "opened dataset"
        );

        if !flags.is_lazy() {
            reader.tables.load_all()?;
        }
        Ok(reader)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn types_hash(&self) -> &str {
        &self.types_hash
    }

    pub fn tables_hash(&self) -> &str {
        &self.tables_hash
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// Format magic of the file, which doubles as its format version.
    pub fn version(&self) -> u32 {
        self.header.magic
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn flags(&self) -> ReadFlags {
        self.flags
    }

    pub fn tables(&self) -> &TableDirectory<R> {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut TableDirectory<R> {
        &mut self.tables
    }

    pub fn table(&mut self, name: &str) -> Result<&Table, Error> {
        self.tables.table(name)
    }

    pub fn table_at(&mut self, index: usize) -> Result<&Table, Error> {
        self.tables.table_at(index)
    }
}

impl DatasetReader<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, flags: ReadFlags) -> Result<Self, Error> {
        Self::open(Cursor::new(bytes.into()), flags)
    }
}

impl DatasetReader<Cursor<Mmap>> {
    /// Memory-maps `path` read-only and opens it.
    pub fn open_path(path: impl AsRef<Path>, flags: ReadFlags) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to open dataset")
                .with_path(path)
                .with_source(err)
        })?;
        let mmap = unsafe {
            Mmap::map(&file).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to map dataset")
                    .with_path(path)
                    .with_source(err)
            })?
        };
        Self::open(Cursor::new(mmap), flags).map_err(|err| err.with_path(path))
    }
}
