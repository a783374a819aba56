use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Write};

use anyhow::{Result, bail};

/// Version needed to extract a stored entry (1.0).
pub const VERSION_NEEDED: u16 = 10;

/// Version made by (2.0, MS-DOS attribute compatibility).
pub const VERSION_MADE_BY: u16 = 20;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

fn name_len(name: &[u8]) -> io::Result<u16> {
    u16::try_from(name.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "file name too long"))
}

/// Local File Header (LFH) - 30 bytes plus the file name
///
/// Written immediately before the entry's payload.
#[derive(Debug, Clone)]
pub struct LocalFileHeader<'a> {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: &'a [u8],
}

impl<'a> LocalFileHeader<'a> {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    /// Header for an uncompressed entry with zeroed timestamps.
    pub fn stored(file_name: &'a [u8], crc32: u32, size: u32) -> Self {
        Self {
            version_needed: VERSION_NEEDED,
            flags: 0,
            compression_method: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: 0,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name,
        }
    }

    /// Bytes taken by the header and the file name.
    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.file_name.len()
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        writer.write_u16::<LittleEndian>(self.last_mod_time)?;
        writer.write_u16::<LittleEndian>(self.last_mod_date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(name_len(self.file_name)?)?;
        writer.write_u16::<LittleEndian>(0)?; // extra field length
        writer.write_all(self.file_name)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes plus the file name
#[derive(Debug, Clone)]
pub struct CentralDirectoryHeader<'a> {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lfh_offset: u32,
    pub file_name: &'a [u8],
}

impl<'a> CentralDirectoryHeader<'a> {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";
    pub const MIN_SIZE: usize = 46;

    /// Directory record pointing back at a stored entry's local header.
    pub fn stored(file_name: &'a [u8], crc32: u32, size: u32, lfh_offset: u32) -> Self {
        Self {
            version_made_by: VERSION_MADE_BY,
            version_needed: VERSION_NEEDED,
            flags: 0,
            compression_method: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: 0,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            lfh_offset,
            file_name,
        }
    }

    pub fn encoded_len(&self) -> usize {
        Self::MIN_SIZE + self.file_name.len()
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.version_made_by)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        writer.write_u16::<LittleEndian>(self.last_mod_time)?;
        writer.write_u16::<LittleEndian>(self.last_mod_date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(name_len(self.file_name)?)?;
        writer.write_u16::<LittleEndian>(0)?; // extra field length
        writer.write_u16::<LittleEndian>(0)?; // file comment length
        writer.write_u16::<LittleEndian>(self.disk_number_start)?;
        writer.write_u16::<LittleEndian>(self.internal_attrs)?;
        writer.write_u32::<LittleEndian>(self.external_attrs)?;
        writer.write_u32::<LittleEndian>(self.lfh_offset)?;
        writer.write_all(self.file_name)?;
        Ok(())
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk trailer without a comment.
    pub fn single_disk(entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("Invalid End of Central Directory");
        }

        // Verify signature
        if &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.disk_number)?;
        writer.write_u16::<LittleEndian>(self.disk_with_cd)?;
        writer.write_u16::<LittleEndian>(self.disk_entries)?;
        writer.write_u16::<LittleEndian>(self.total_entries)?;
        writer.write_u32::<LittleEndian>(self.cd_size)?;
        writer.write_u32::<LittleEndian>(self.cd_offset)?;
        writer.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }

    /// Whether any field carries the ZIP64 escape value.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// Metadata of one archive entry as recorded in the central directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub crc32: u32,
    pub lfh_offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_header_layout() {
        let header = LocalFileHeader::stored(b"icon16.png", 0xDEAD_BEEF, 300);
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        assert_eq!(buf.len(), header.encoded_len());
        assert_eq!(buf.len(), 30 + 10);
        assert_eq!(&buf[0..4], &[0x50, 0x4B, 0x03, 0x04]);
        assert_eq!(&buf[4..6], &10u16.to_le_bytes());
        assert_eq!(&buf[6..14], &[0u8; 8]);
        assert_eq!(&buf[14..18], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&buf[18..22], &300u32.to_le_bytes());
        assert_eq!(&buf[22..26], &300u32.to_le_bytes());
        assert_eq!(&buf[26..28], &10u16.to_le_bytes());
        assert_eq!(&buf[28..30], &[0, 0]);
        assert_eq!(&buf[30..], b"icon16.png");
    }

    #[test]
    fn central_header_layout() {
        let header = CentralDirectoryHeader::stored(b"icon48.png", 0x0102_0304, 77, 1234);
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        assert_eq!(buf.len(), 46 + 10);
        assert_eq!(&buf[0..4], &[0x50, 0x4B, 0x01, 0x02]);
        assert_eq!(&buf[4..6], &20u16.to_le_bytes());
        assert_eq!(&buf[6..8], &10u16.to_le_bytes());
        assert_eq!(&buf[8..16], &[0u8; 8]);
        assert_eq!(&buf[16..20], &0x0102_0304u32.to_le_bytes());
        assert_eq!(&buf[20..24], &77u32.to_le_bytes());
        assert_eq!(&buf[24..28], &77u32.to_le_bytes());
        assert_eq!(&buf[28..30], &10u16.to_le_bytes());
        assert_eq!(&buf[30..42], &[0u8; 12]);
        assert_eq!(&buf[42..46], &1234u32.to_le_bytes());
        assert_eq!(&buf[46..], b"icon48.png");
    }

    #[test]
    fn end_record_layout_and_parse() {
        let eocd = EndOfCentralDirectory::single_disk(2, 112, 900);
        let mut buf = Vec::new();
        eocd.write(&mut buf).unwrap();

        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(&buf[0..4], &[0x50, 0x4B, 0x05, 0x06]);
        assert_eq!(&buf[8..10], &2u16.to_le_bytes());
        assert_eq!(&buf[10..12], &2u16.to_le_bytes());
        assert_eq!(&buf[12..16], &112u32.to_le_bytes());
        assert_eq!(&buf[16..20], &900u32.to_le_bytes());
        assert_eq!(EndOfCentralDirectory::from_bytes(&buf).unwrap(), eocd);
        assert!(!eocd.is_zip64());
    }

    #[test]
    fn end_record_rejects_bad_signature() {
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        buf[0..4].copy_from_slice(b"PK\x03\x04");
        assert!(EndOfCentralDirectory::from_bytes(&buf).is_err());
        assert!(EndOfCentralDirectory::from_bytes(&buf[..10]).is_err());
    }

    #[test]
    fn compression_method_codes() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12).as_u16(), 12);
    }
}
