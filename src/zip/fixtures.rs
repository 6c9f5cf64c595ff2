//! Archives laid out the way streaming writers such as Info-ZIP and Python's
//! `zipfile` produce them, for exercising the reader against more than
//! [`ZipWriter`](super::ZipWriter) output.
//!
//! Compared to our writer, every entry here:
//! - sets bit 3 and leaves CRC and sizes zero in the local header, with a data
//!   descriptor after the payload
//! - carries an extended-timestamp extra field (0x5455) in the local header only
//! - optionally goes through ZIP64 records, with every central directory size
//!   and offset saturated and moved into a 0x0001 extra field

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;

use super::structures::*;

const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
const DATA_DESCRIPTOR_SIGNATURE: &[u8] = b"PK\x07\x08";
const VERSION_ZIP64: u16 = 45;
/// Unix host, spec version 3.0
const MADE_BY_UNIX: u16 = (3 << 8) | 30;

pub struct RawEntry {
    pub name: String,
    pub flags: u16,
    pub method: u16,
    pub payload: Vec<u8>,
    pub crc32: u32,
    pub size: u64,
}

impl RawEntry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            flags: 0,
            method: 0,
            payload: data.to_vec(),
            crc32: checksum(data),
            size: data.len() as u64,
        }
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        Self {
            method: 8,
            payload: encoder.finish().unwrap(),
            ..Self::stored(name, data)
        }
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_method(mut self, method: u16) -> Self {
        self.method = method;
        self
    }
}

fn checksum(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

#[derive(Default)]
pub struct ForeignArchive {
    entries: Vec<RawEntry>,
    comment: Vec<u8>,
    zip64: bool,
}

impl ForeignArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: RawEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let needed = if self.zip64 { VERSION_ZIP64 } else { VERSION };

        let mut offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            offsets.push(out.len() as u64);
            out.write_all(LFH_SIGNATURE).unwrap();
            out.write_u16::<LittleEndian>(needed).unwrap();
            out.write_u16::<LittleEndian>(entry.flags | FLAG_DATA_DESCRIPTOR).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(0x6000).unwrap(); // 12:00
            out.write_u16::<LittleEndian>(0x5A21).unwrap(); // 2025-01-01
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(9).unwrap();
            out.write_all(entry.name.as_bytes()).unwrap();
            // Extended timestamp: flags + mtime
            out.write_u16::<LittleEndian>(0x5455).unwrap();
            out.write_u16::<LittleEndian>(5).unwrap();
            out.write_u8(1).unwrap();
            out.write_u32::<LittleEndian>(1_735_732_800).unwrap();
            out.write_all(&entry.payload).unwrap();

            out.write_all(DATA_DESCRIPTOR_SIGNATURE).unwrap();
            out.write_u32::<LittleEndian>(entry.crc32).unwrap();
            if self.zip64 {
                out.write_u64::<LittleEndian>(entry.payload.len() as u64).unwrap();
                out.write_u64::<LittleEndian>(entry.size).unwrap();
            } else {
                out.write_u32::<LittleEndian>(entry.payload.len() as u32).unwrap();
                out.write_u32::<LittleEndian>(entry.size as u32).unwrap();
            }
        }

        let cd_offset = out.len() as u64;
        for (entry, offset) in self.entries.iter().zip(&offsets) {
            out.write_all(CDFH_SIGNATURE).unwrap();
            out.write_u16::<LittleEndian>(MADE_BY_UNIX).unwrap();
            out.write_u16::<LittleEndian>(needed).unwrap();
            out.write_u16::<LittleEndian>(entry.flags | FLAG_DATA_DESCRIPTOR).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(0x6000).unwrap();
            out.write_u16::<LittleEndian>(0x5A21).unwrap();
            out.write_u32::<LittleEndian>(entry.crc32).unwrap();
            if self.zip64 {
                out.write_u32::<LittleEndian>(u32::MAX).unwrap();
                out.write_u32::<LittleEndian>(u32::MAX).unwrap();
            } else {
                out.write_u32::<LittleEndian>(entry.payload.len() as u32).unwrap();
                out.write_u32::<LittleEndian>(entry.size as u32).unwrap();
            }
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(if self.zip64 { 28 } else { 0 }).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap(); // file comment length
            out.write_u16::<LittleEndian>(0).unwrap(); // disk number start
            out.write_u16::<LittleEndian>(0).unwrap(); // internal attributes
            out.write_u32::<LittleEndian>(0o100644 << 16).unwrap();
            out.write_u32::<LittleEndian>(if self.zip64 { u32::MAX } else { *offset as u32 })
                .unwrap();
            out.write_all(entry.name.as_bytes()).unwrap();
            if self.zip64 {
                // Order is fixed: uncompressed size, compressed size, header offset
                out.write_u16::<LittleEndian>(0x0001).unwrap();
                out.write_u16::<LittleEndian>(24).unwrap();
                out.write_u64::<LittleEndian>(entry.size).unwrap();
                out.write_u64::<LittleEndian>(entry.payload.len() as u64).unwrap();
                out.write_u64::<LittleEndian>(*offset).unwrap();
            }
        }
        let cd_size = out.len() as u64 - cd_offset;
        let total = self.entries.len() as u64;

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.write_all(Zip64EOCD::SIGNATURE).unwrap();
            out.write_u64::<LittleEndian>(Zip64EOCD::MIN_SIZE as u64 - 12).unwrap();
            out.write_u16::<LittleEndian>(MADE_BY_UNIX).unwrap();
            out.write_u16::<LittleEndian>(VERSION_ZIP64).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(total).unwrap();
            out.write_u64::<LittleEndian>(total).unwrap();
            out.write_u64::<LittleEndian>(cd_size).unwrap();
            out.write_u64::<LittleEndian>(cd_offset).unwrap();

            out.write_all(Zip64EOCDLocator::SIGNATURE).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
            out.write_u32::<LittleEndian>(1).unwrap();
        }

        let (entries16, cd_size32, cd_offset32) = if self.zip64 {
            (0xFFFF, u32::MAX, u32::MAX)
        } else {
            (total as u16, cd_size as u32, cd_offset as u32)
        };
        EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries16,
            total_entries: entries16,
            cd_size: cd_size32,
            cd_offset: cd_offset32,
            comment_len: self.comment.len() as u16,
        }
        .write_to(&mut out)
        .unwrap();
        out.extend_from_slice(&self.comment);
        out
    }
}
