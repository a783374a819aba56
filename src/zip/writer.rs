//! Stored-only ZIP archive writer.
//!
//! Entries are emitted in the order they are added:
//!
//! 1. Each entry's Local File Header, name and payload go straight to the
//!    sink, and the byte count written so far becomes the next entry's
//!    local header offset.
//! 2. The matching Central Directory records are buffered and written in
//!    the same order by [`ZipWriter::finish`].
//! 3. The End of Central Directory record closes the archive, with its
//!    counts and offsets taken from what was actually written.

use std::collections::HashSet;
use std::io::Write;

use log::{debug, info};

use crate::error::{IconError, Result};

use super::crc32;
use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};

/// Upper bounds enforced while writing an archive.
///
/// The defaults are the limits of the plain (non-ZIP64) format. Callers
/// may tighten them, e.g. to cap the size of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_entries: u16,
    pub max_archive_size: u32,
}

impl ArchiveLimits {
    pub const FORMAT: Self = Self {
        max_entries: u16::MAX,
        max_archive_size: u32::MAX,
    };
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self::FORMAT
    }
}

/// The two records produced for one entry.
#[derive(Debug, Clone)]
pub struct EntryRecords {
    /// Local file header, name and payload.
    pub local: Vec<u8>,
    /// Central directory header and name.
    pub central: Vec<u8>,
    pub crc32: u32,
}

/// Metadata of an entry already written by a [`ZipWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub crc32: u32,
    pub size: u32,
    pub lfh_offset: u32,
}

fn assembly_error(msg: impl Into<String>) -> IconError {
    IconError::ArchiveAssembly(msg.into())
}

/// Build the local and central records for one stored entry.
///
/// # Arguments
///
/// * `name` - Entry name; its UTF-8 bytes are stored verbatim
/// * `payload` - Entry contents, stored without compression
/// * `offset` - Offset of this entry's local header from the archive start
///
/// # Errors
///
/// Returns [`IconError::ArchiveAssembly`] if the name is empty or any
/// field does not fit its 16/32-bit slot.
pub fn build_entry(name: &str, payload: &[u8], offset: u64) -> Result<EntryRecords> {
    let name_bytes = name.as_bytes();
    if name_bytes.is_empty() {
        return Err(assembly_error("entry name is empty"));
    }
    if name_bytes.len() > u16::MAX as usize {
        return Err(assembly_error(format!(
            "entry name is {} bytes, limit is {}",
            name_bytes.len(),
            u16::MAX
        )));
    }
    let size = u32::try_from(payload.len())
        .map_err(|_| assembly_error(format!("{name}: payload exceeds 4 GiB")))?;
    let lfh_offset = u32::try_from(offset)
        .map_err(|_| assembly_error(format!("{name}: local header offset exceeds 4 GiB")))?;

    let crc32 = crc32::checksum(payload);

    let header = LocalFileHeader::stored(name_bytes, crc32, size);
    let mut local = Vec::with_capacity(header.encoded_len() + payload.len());
    header.write(&mut local)?;
    local.extend_from_slice(payload);

    let record = CentralDirectoryHeader::stored(name_bytes, crc32, size, lfh_offset);
    let mut central = Vec::with_capacity(record.encoded_len());
    record.write(&mut central)?;

    Ok(EntryRecords {
        local,
        central,
        crc32,
    })
}

/// Streaming writer for stored ZIP archives.
///
/// ## Example
///
/// ```
/// use iconzip::zip::ZipWriter;
///
/// let mut writer = ZipWriter::new(Vec::new());
/// writer.add_entry("hello.txt", b"Hello, world!")?;
/// let archive = writer.finish()?;
/// assert_eq!(&archive[0..4], b"PK\x03\x04");
/// # Ok::<(), iconzip::IconError>(())
/// ```
pub struct ZipWriter<W: Write> {
    sink: W,
    limits: ArchiveLimits,
    /// Bytes of local records written so far
    offset: u64,
    /// Concatenated central directory records
    central: Vec<u8>,
    entries: Vec<ArchiveEntry>,
    names: HashSet<String>,
    /// Set once a sink write fails; the sink may hold a partial record
    failed: bool,
}

impl<W: Write> ZipWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_limits(sink, ArchiveLimits::default())
    }

    pub fn with_limits(sink: W, limits: ArchiveLimits) -> Self {
        Self {
            sink,
            limits,
            offset: 0,
            central: Vec::new(),
            entries: Vec::new(),
            names: HashSet::new(),
            failed: false,
        }
    }

    /// Append one stored entry.
    ///
    /// The local record is written to the sink before this returns; nothing
    /// is written if the entry is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IconError::ArchiveAssembly`] for duplicate or invalid names
    /// and when the entry would break the configured [`ArchiveLimits`], or
    /// [`IconError::Io`] if the sink fails.
    pub fn add_entry(&mut self, name: &str, payload: &[u8]) -> Result<&ArchiveEntry> {
        self.ensure_usable()?;
        if self.names.contains(name) {
            return Err(assembly_error(format!("duplicate entry name: {name}")));
        }
        if self.entries.len() >= self.limits.max_entries as usize {
            return Err(assembly_error(format!(
                "archive is limited to {} entries",
                self.limits.max_entries
            )));
        }

        let records = build_entry(name, payload, self.offset)?;

        // Later entries only grow the archive; `finish` relies on this check.
        let next_offset = self.offset + records.local.len() as u64;
        let projected = next_offset
            + (self.central.len() + records.central.len()) as u64
            + EndOfCentralDirectory::SIZE as u64;
        if projected > self.limits.max_archive_size as u64 {
            return Err(assembly_error(format!(
                "{name}: archive would grow to {projected} bytes, limit is {}",
                self.limits.max_archive_size
            )));
        }

        if let Err(e) = self.sink.write_all(&records.local) {
            self.failed = true;
            return Err(e.into());
        }

        let entry = ArchiveEntry {
            name: name.to_string(),
            crc32: records.crc32,
            size: payload.len() as u32,
            lfh_offset: self.offset as u32,
        };
        debug!(
            "Added {} ({} bytes, crc32 {:08x}) at offset {}",
            entry.name, entry.size, entry.crc32, entry.lfh_offset
        );

        self.offset = next_offset;
        self.central.extend_from_slice(&records.central);
        self.names.insert(entry.name.clone());
        self.entries.push(entry);

        Ok(&self.entries[self.entries.len() - 1])
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.failed {
            return Err(assembly_error("writer failed earlier, sink holds a partial record"));
        }
        Ok(())
    }

    /// Entries written so far, in emission order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Bytes written to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.offset
    }

    /// Write the central directory and the end record, returning the sink.
    ///
    /// # Errors
    ///
    /// Returns [`IconError::ArchiveAssembly`] if an earlier sink write
    /// failed, since the bytes already written no longer match the recorded
    /// offsets.
    pub fn finish(mut self) -> Result<W> {
        self.ensure_usable()?;
        let count = self.entries.len() as u16;
        let cd_size = u32::try_from(self.central.len())
            .map_err(|_| assembly_error("central directory exceeds 4 GiB"))?;
        let cd_offset = u32::try_from(self.offset)
            .map_err(|_| assembly_error("central directory offset exceeds 4 GiB"))?;

        self.sink.write_all(&self.central)?;
        EndOfCentralDirectory::single_disk(count, cd_size, cd_offset).write(&mut self.sink)?;
        self.sink.flush()?;

        info!(
            "Archive finished: {} entries, {} bytes",
            count,
            self.offset + cd_size as u64 + EndOfCentralDirectory::SIZE as u64
        );

        Ok(self.sink)
    }
}

/// Assemble an in-memory archive from `(name, payload)` pairs in order.
pub fn assemble<I, N, P>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (N, P)>,
    N: AsRef<str>,
    P: AsRef<[u8]>,
{
    assemble_with_limits(entries, ArchiveLimits::default())
}

/// Same as [`assemble`] with explicit limits.
pub fn assemble_with_limits<I, N, P>(entries: I, limits: ArchiveLimits) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (N, P)>,
    N: AsRef<str>,
    P: AsRef<[u8]>,
{
    let mut writer = ZipWriter::with_limits(Vec::new(), limits);
    for (name, payload) in entries {
        writer.add_entry(name.as_ref(), payload.as_ref())?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::structures::{CentralDirectoryHeader, LocalFileHeader};

    fn read_u16(buf: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([buf[at], buf[at + 1]])
    }

    fn read_u32(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn entry_records_carry_payload_and_offset() {
        let records = build_entry("icon16.png", b"payload", 4096).unwrap();

        assert_eq!(records.crc32, crc32::checksum(b"payload"));
        assert_eq!(records.local.len(), LocalFileHeader::SIZE + 10 + 7);
        assert_eq!(&records.local[30..40], b"icon16.png");
        assert_eq!(&records.local[40..], b"payload");
        assert_eq!(read_u32(&records.local, 14), records.crc32);

        assert_eq!(records.central.len(), CentralDirectoryHeader::MIN_SIZE + 10);
        assert_eq!(read_u32(&records.central, 16), records.crc32);
        assert_eq!(read_u32(&records.central, 42), 4096);
    }

    #[test]
    fn entry_name_length_counts_utf8_bytes() {
        let records = build_entry("ícone.png", b"x", 0).unwrap();
        assert_eq!(read_u16(&records.local, 26), "ícone.png".len() as u16);
        assert_eq!(read_u16(&records.central, 28), "ícone.png".len() as u16);
    }

    #[test]
    fn empty_payload_is_allowed() {
        let records = build_entry("empty.bin", b"", 0).unwrap();
        assert_eq!(records.crc32, 0);
        assert_eq!(read_u32(&records.local, 18), 0);
    }

    #[test]
    fn invalid_entries_are_rejected() {
        assert!(matches!(
            build_entry("", b"x", 0),
            Err(IconError::ArchiveAssembly(_))
        ));
        let long = "a".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            build_entry(&long, b"x", 0),
            Err(IconError::ArchiveAssembly(_))
        ));
        assert!(matches!(
            build_entry("late.png", b"x", u32::MAX as u64 + 1),
            Err(IconError::ArchiveAssembly(_))
        ));
    }

    #[test]
    fn empty_archive_is_only_the_end_record() {
        let archive = ZipWriter::new(Vec::new()).finish().unwrap();
        assert_eq!(archive.len(), EndOfCentralDirectory::SIZE);
        let eocd = EndOfCentralDirectory::from_bytes(&archive).unwrap();
        assert_eq!(eocd, EndOfCentralDirectory::single_disk(0, 0, 0));
    }

    #[test]
    fn offsets_follow_local_record_lengths() {
        let items: [(&str, &[u8]); 3] = [
            ("a.png", b"first"),
            ("bb.png", b"second payload"),
            ("ccc.png", b""),
        ];

        let mut writer = ZipWriter::new(Vec::new());
        let mut expected = 0u32;
        for (name, payload) in items {
            let entry = writer.add_entry(name, payload).unwrap();
            assert_eq!(entry.lfh_offset, expected);
            expected += (LocalFileHeader::SIZE + name.len() + payload.len()) as u32;
        }
        assert_eq!(writer.bytes_written(), expected as u64);

        let archive = writer.finish().unwrap();
        let eocd = EndOfCentralDirectory::from_bytes(&archive[archive.len() - 22..]).unwrap();
        assert_eq!(eocd.total_entries, 3);
        assert_eq!(eocd.disk_entries, 3);
        assert_eq!(eocd.cd_offset, expected);
        assert_eq!(
            eocd.cd_size as usize,
            archive.len() - expected as usize - EndOfCentralDirectory::SIZE
        );
    }

    #[test]
    fn duplicate_names_are_rejected_without_writing() {
        let mut writer = ZipWriter::new(Vec::new());
        writer.add_entry("icon16.png", b"one").unwrap();
        let written = writer.bytes_written();

        let err = writer.add_entry("icon16.png", b"two").unwrap_err();
        assert!(matches!(err, IconError::ArchiveAssembly(_)));
        assert_eq!(writer.bytes_written(), written);
        assert_eq!(writer.entries().len(), 1);
    }

    #[test]
    fn limits_are_enforced() {
        let limits = ArchiveLimits {
            max_entries: 1,
            max_archive_size: u32::MAX,
        };
        let err = assemble_with_limits([("a", b"1"), ("b", b"2")], limits).unwrap_err();
        assert!(matches!(err, IconError::ArchiveAssembly(_)));

        let limits = ArchiveLimits {
            max_entries: u16::MAX,
            max_archive_size: 100,
        };
        let err = assemble_with_limits([("big.bin", vec![0u8; 64])], limits).unwrap_err();
        assert!(matches!(err, IconError::ArchiveAssembly(_)));
    }

    #[test]
    fn archive_exactly_at_limit_is_accepted() {
        // 30 + 1 + 1 local, 46 + 1 central, 22 end
        let limits = ArchiveLimits {
            max_entries: 1,
            max_archive_size: 101,
        };
        let archive = assemble_with_limits([("a", b"1")], limits).unwrap();
        assert_eq!(archive.len(), 101);
    }

    #[test]
    fn sink_errors_are_io_errors() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = ZipWriter::new(Broken);
        assert!(matches!(
            writer.add_entry("a", b"1"),
            Err(IconError::Io(_))
        ));
    }

    /// Accepts `budget` bytes, then fails every write.
    struct ShortSink {
        written: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let room = self.budget - self.written.len();
            if room == 0 {
                return Err(std::io::Error::other("transient"));
            }
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_mid_record_stops_the_writer() {
        // First record is 30 + 1 + 4 = 35 bytes; the second breaks 10 bytes in.
        let sink = ShortSink {
            written: Vec::new(),
            budget: 45,
        };
        let mut writer = ZipWriter::new(sink);
        writer.add_entry("a", b"1234").unwrap();

        assert!(matches!(
            writer.add_entry("b", b"5678"),
            Err(IconError::Io(_))
        ));
        assert_eq!(writer.bytes_written(), 35);

        assert!(matches!(
            writer.add_entry("c", b"9"),
            Err(IconError::ArchiveAssembly(_))
        ));
        assert_eq!(writer.entries().len(), 1);
        assert!(matches!(
            writer.finish(),
            Err(IconError::ArchiveAssembly(_))
        ));
    }
}
