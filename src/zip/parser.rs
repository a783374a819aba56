//! Reader for the stored archives this crate writes.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data
//!
//! Only single-disk, non-ZIP64 archives with STORED entries are accepted,
//! which is everything [`ZipWriter`](super::ZipWriter) produces. The CLI
//! uses this to test a freshly written archive.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::ops::Range;

use anyhow::{Result, bail};

use super::crc32;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Parser over an archive held in memory.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the archive).
    ///
    /// # Errors
    ///
    /// Returns an error if no valid EOCD can be found.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, usize)> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            bail!("Not a valid ZIP file");
        }

        // Common case: no archive comment.
        let offset = size - EndOfCentralDirectory::SIZE;
        let tail = &self.data[offset..];
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(tail)?, offset));
        }

        // Otherwise search backwards; the comment length must account for
        // every byte after the record.
        let search_start = size.saturating_sub(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE);
        for i in (search_start..=offset).rev() {
            if &self.data[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([self.data[i + 20], self.data[i + 21]]) as usize;
            if comment_len == size - i - EndOfCentralDirectory::SIZE {
                let eocd = EndOfCentralDirectory::from_bytes(&self.data[i..])?;
                return Ok((eocd, i));
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// List all entries in the archive, in central directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        if eocd.is_zip64() {
            bail!("ZIP64 archives are not supported");
        }
        if eocd.disk_number != 0 || eocd.disk_with_cd != 0 || eocd.disk_entries != eocd.total_entries
        {
            bail!("Multi-disk archives are not supported");
        }

        let cd_start = eocd.cd_offset as usize;
        let cd_end = cd_start + eocd.cd_size as usize;
        if cd_end > eocd_offset {
            bail!("Central Directory extends past End of Central Directory");
        }

        let mut cursor = Cursor::new(&self.data[cd_start..cd_end]);
        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        for _ in 0..eocd.total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        if cursor.position() as usize != cd_end - cd_start {
            bail!("Central Directory size does not match its entries");
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CentralDirectoryHeader::SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()?;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Neither extra fields nor comments carry anything we use.
        let skip = extra_field_length as u64 + file_comment_length as u64;
        cursor.set_position(cursor.position() + skip);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
        })
    }

    /// Byte range of an entry's data, found through its Local File Header.
    pub fn data_range(&self, entry: &ZipFileEntry) -> Result<Range<usize>> {
        let lfh_start = entry.lfh_offset as usize;
        let lfh_end = lfh_start + LocalFileHeader::SIZE;
        if lfh_end > self.data.len() {
            bail!("Local File Header of {} is out of bounds", entry.file_name);
        }

        let lfh = &self.data[lfh_start..lfh_end];
        if &lfh[0..4] != LocalFileHeader::SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let mut cursor = Cursor::new(lfh);
        cursor.set_position(26); // Offset to filename length field
        let file_name_length = cursor.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as usize;

        let start = lfh_end + file_name_length + extra_field_length;
        let end = start + entry.compressed_size as usize;
        if end > self.data.len() {
            bail!("Data of {} is out of bounds", entry.file_name);
        }

        Ok(start..end)
    }

    /// Read an entry's contents and check them against the recorded CRC-32.
    pub fn read_file(&self, entry: &ZipFileEntry) -> Result<&'a [u8]> {
        if entry.compression_method != CompressionMethod::Stored {
            bail!(
                "Unsupported compression method: {} (only STORED/uncompressed is supported)",
                entry.compression_method.as_u16()
            );
        }
        if entry.compressed_size != entry.uncompressed_size {
            bail!("Stored entry {} has mismatched sizes", entry.file_name);
        }

        let data = &self.data[self.data_range(entry)?];
        let actual = crc32::checksum(data);
        if actual != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                actual
            );
        }

        Ok(data)
    }
}
