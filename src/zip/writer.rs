//! Sequential ZIP writer.
//!
//! Entries are fully in memory when written, so sizes and CRC-32 are known
//! before the Local File Header goes out and no data descriptors are needed.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use super::error::{Result, ZipError};
use super::structures::*;

/// What the Central Directory needs to remember about a written entry.
struct CentralRecord {
    name: String,
    flags: u16,
    method: CompressionMethod,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    lfh_offset: u32,
}

/// Writes entries one after another, then the Central Directory on [`finish`](Self::finish).
pub struct ZipWriter<W: Write> {
    inner: W,
    offset: u64,
    records: Vec<CentralRecord>,
}

impl<W: Write> ZipWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            offset: 0,
            records: Vec::new(),
        }
    }

    /// Append one entry. Only STORED and DEFLATE can be written.
    pub fn write_entry(&mut self, name: &str, data: &[u8], method: CompressionMethod) -> Result<()> {
        let mut crc = Crc::new();
        crc.update(data);

        let compressed = match method {
            CompressionMethod::Stored => None,
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Some(encoder.finish()?)
            }
            CompressionMethod::Unknown(method) => {
                return Err(ZipError::UnsupportedCompression {
                    name: name.to_string(),
                    method,
                });
            }
        };
        let payload = compressed.as_deref().unwrap_or(data);

        let flags = if name.is_ascii() { 0 } else { FLAG_UTF8 };
        let record = CentralRecord {
            name: name.to_string(),
            flags,
            method,
            crc32: crc.sum(),
            compressed_size: fit_u32(payload.len() as u64)?,
            uncompressed_size: fit_u32(data.len() as u64)?,
            lfh_offset: fit_u32(self.offset)?,
        };
        let name_len = u16::try_from(name.len()).map_err(|_| ZipError::TooLarge)?;

        let out = &mut self.inner;
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION)?;
        out.write_u16::<LittleEndian>(record.flags)?;
        out.write_u16::<LittleEndian>(record.method.as_u16())?;
        out.write_u16::<LittleEndian>(DOS_TIME)?;
        out.write_u16::<LittleEndian>(DOS_DATE)?;
        out.write_u32::<LittleEndian>(record.crc32)?;
        out.write_u32::<LittleEndian>(record.compressed_size)?;
        out.write_u32::<LittleEndian>(record.uncompressed_size)?;
        out.write_u16::<LittleEndian>(name_len)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_all(name.as_bytes())?;
        out.write_all(payload)?;

        self.offset += (LFH_SIZE + name.len() + payload.len()) as u64;
        self.records.push(record);
        Ok(())
    }

    /// Write the Central Directory and End of Central Directory, returning the inner writer.
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = fit_u32(self.offset)?;
        let total_entries = u16::try_from(self.records.len())
            .ok()
            .filter(|n| *n != 0xFFFF)
            .ok_or(ZipError::TooLarge)?;

        let mut cd_size = 0u64;
        for record in &self.records {
            let out = &mut self.inner;
            out.write_all(CDFH_SIGNATURE)?;
            out.write_u16::<LittleEndian>(VERSION)?; // version made by
            out.write_u16::<LittleEndian>(VERSION)?; // version needed
            out.write_u16::<LittleEndian>(record.flags)?;
            out.write_u16::<LittleEndian>(record.method.as_u16())?;
            out.write_u16::<LittleEndian>(DOS_TIME)?;
            out.write_u16::<LittleEndian>(DOS_DATE)?;
            out.write_u32::<LittleEndian>(record.crc32)?;
            out.write_u32::<LittleEndian>(record.compressed_size)?;
            out.write_u32::<LittleEndian>(record.uncompressed_size)?;
            out.write_u16::<LittleEndian>(record.name.len() as u16)?;
            out.write_u16::<LittleEndian>(0)?; // extra field length
            out.write_u16::<LittleEndian>(0)?; // file comment length
            out.write_u16::<LittleEndian>(0)?; // disk number start
            out.write_u16::<LittleEndian>(0)?; // internal attributes
            out.write_u32::<LittleEndian>(0)?; // external attributes
            out.write_u32::<LittleEndian>(record.lfh_offset)?;
            out.write_all(record.name.as_bytes())?;
            cd_size += (CDFH_MIN_SIZE + record.name.len()) as u64;
        }

        EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size: fit_u32(cd_size)?,
            cd_offset,
            comment_len: 0,
        }
        .write_to(&mut self.inner)?;

        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Values of 0xFFFFFFFF and above would require ZIP64 records.
fn fit_u32(value: u64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v != u32::MAX)
        .ok_or(ZipError::TooLarge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipExtractor;
    use std::sync::Arc;

    #[tokio::test]
    async fn written_archive_reads_back() {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .write_entry("mimetype", b"application/epub+zip", CompressionMethod::Stored)
            .unwrap();
        writer
            .write_entry("OEBPS/chap1.xhtml", &b"<p>hello</p>".repeat(50), CompressionMethod::Deflate)
            .unwrap();
        writer
            .write_entry("OEBPS/empty.css", b"", CompressionMethod::Deflate)
            .unwrap();
        let bytes = writer.finish().unwrap();

        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(bytes)));
        let entries = extractor.list_files().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["mimetype", "OEBPS/chap1.xhtml", "OEBPS/empty.css"]);

        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[1].compression_method, CompressionMethod::Deflate);
        assert!(entries[1].compressed_size < entries[1].uncompressed_size);

        let chapter = extractor.extract_to_memory(&entries[1]).await.unwrap();
        assert_eq!(chapter, b"<p>hello</p>".repeat(50));
        assert!(extractor.extract_to_memory(&entries[2]).await.unwrap().is_empty());
    }

    #[test]
    fn mimetype_is_stored_at_a_fixed_offset() {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .write_entry("mimetype", b"application/epub+zip", CompressionMethod::Stored)
            .unwrap();
        let bytes = writer.finish().unwrap();

        assert_eq!(&bytes[0..4], LFH_SIGNATURE);
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 0, "flags");
        assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 0, "method");
        assert_eq!(u16::from_le_bytes([bytes[28], bytes[29]]), 0, "extra field length");
        assert_eq!(&bytes[30..38], b"mimetype");
        assert_eq!(&bytes[38..58], b"application/epub+zip");
    }

    #[test]
    fn non_ascii_names_are_flagged_utf8() {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .write_entry("OEBPS/café.xhtml", b"", CompressionMethod::Stored)
            .unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), FLAG_UTF8);
    }

    #[test]
    fn unknown_methods_are_refused() {
        let mut writer = ZipWriter::new(Vec::new());
        let err = writer
            .write_entry("a", b"x", CompressionMethod::Unknown(14))
            .unwrap_err();
        assert!(matches!(err, ZipError::UnsupportedCompression { method: 14, .. }));
    }

    #[test]
    fn entry_count_needing_zip64_is_too_large() {
        let mut writer = ZipWriter::new(Vec::new());
        for i in 0..0xFFFF {
            writer
                .write_entry(&format!("OEBPS/{i}.css"), b"", CompressionMethod::Stored)
                .unwrap();
        }
        assert!(matches!(writer.finish(), Err(ZipError::TooLarge)));
    }

    #[test]
    fn largest_plain_entry_count_still_fits() {
        let mut writer = ZipWriter::new(Vec::new());
        for i in 0..0xFFFE {
            writer
                .write_entry(&format!("{i}"), b"", CompressionMethod::Stored)
                .unwrap();
        }
        let bytes = writer.finish().unwrap();
        let eocd = EndOfCentralDirectory::from_bytes(&bytes[bytes.len() - 22..]).unwrap();
        assert_eq!(eocd.total_entries, 0xFFFE);
        assert!(!eocd.is_zip64());
    }
}
