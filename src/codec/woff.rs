use std::collections::BTreeMap;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::debug;
use write_fonts::types::Tag;

use crate::codec::error::{FontError, FontResult};
use crate::codec::reader::{check_declared_size, pad4, push_u16, push_u32, table_checksum, ByteReader};
use crate::codec::sfnt::{font_revision, total_sfnt_size};

pub const WOFF_SIGNATURE: u32 = u32::from_be_bytes(*b"wOFF");
const HEADER_SIZE: usize = 44;
const DIRECTORY_ENTRY_SIZE: usize = 20;

/// 將表格打包為 WOFF 1.0，每個表格各自以 zlib 壓縮
pub fn encode(sfnt_version: u32, tables: &BTreeMap<Tag, Vec<u8>>) -> FontResult<Vec<u8>> {
    let num_tables = tables.len();
    let directory_size = DIRECTORY_ENTRY_SIZE * num_tables;
    let mut offset = HEADER_SIZE + directory_size;
    let mut directory = Vec::with_capacity(directory_size);
    let mut body = Vec::new();

    for (tag, data) in tables {
        let compressed = compress_table(data)?;
        // 壓縮無效時直接存放原始資料，compLength 等於 origLength
        let stored: &[u8] = if compressed.len() < data.len() { &compressed } else { data };
        directory.extend_from_slice(&tag.to_be_bytes());
        push_u32(&mut directory, offset as u32);
        push_u32(&mut directory, stored.len() as u32);
        push_u32(&mut directory, data.len() as u32);
        push_u32(&mut directory, table_checksum(*tag, data));
        body.extend_from_slice(stored);
        pad4(&mut body);
        offset = HEADER_SIZE + directory_size + body.len();
    }

    let total_length = HEADER_SIZE + directory.len() + body.len();
    let (major, minor) = font_revision(tables);
    let mut out = Vec::with_capacity(total_length);
    push_u32(&mut out, WOFF_SIGNATURE);
    push_u32(&mut out, sfnt_version);
    push_u32(&mut out, total_length as u32);
    push_u16(&mut out, num_tables as u16);
    push_u16(&mut out, 0);
    push_u32(&mut out, total_sfnt_size(tables));
    push_u16(&mut out, major);
    push_u16(&mut out, minor);
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    for _ in 0..5 {
        push_u32(&mut out, 0);
    }
    out.extend_from_slice(&directory);
    out.extend_from_slice(&body);
    debug!("WOFF 編碼完成：{} 個表格，{} 位元組", num_tables, out.len());
    Ok(out)
}

/// 解開 WOFF 1.0，回傳 sfnt 版本與表格；中繼資料與私有資料區塊不保留
pub fn decode(data: &[u8]) -> FontResult<(u32, BTreeMap<Tag, Vec<u8>>)> {
    let mut header = ByteReader::new(data, "WOFF 標頭");
    if header.read_u32()? != WOFF_SIGNATURE {
        return Err(FontError::Woff("簽章不符".to_string()));
    }
    let flavor = header.read_u32()?;
    let length = header.read_u32()? as usize;
    let num_tables = header.read_u16()? as usize;
    header.skip(HEADER_SIZE - header.position())?;
    if length > data.len() {
        return Err(FontError::Woff(format!("標頭長度 {} 大於檔案大小 {}", length, data.len())));
    }

    let mut tables = BTreeMap::new();
    let mut declared_total: u64 = 0;
    for _ in 0..num_tables {
        let tag = header.read_tag()?;
        let offset = header.read_u32()? as usize;
        let comp_length = header.read_u32()? as usize;
        let orig_length = header.read_u32()?;
        let _orig_checksum = header.read_u32()?;
        declared_total += u64::from(orig_length);
        check_declared_size(declared_total, "WOFF 表格")?;
        let orig_length = orig_length as usize;

        let stored = offset
            .checked_add(comp_length)
            .and_then(|end| data.get(offset..end))
            .ok_or(FontError::Truncated("WOFF 表格超出檔案範圍"))?;
        let table = if comp_length < orig_length {
            decompress_table(stored, orig_length)?
        } else if comp_length == orig_length {
            stored.to_vec()
        } else {
            return Err(FontError::Woff(format!(
                "表格 {} 壓縮長度 {} 大於原始長度 {}",
                tag, comp_length, orig_length
            )));
        };
        if tables.insert(tag, table).is_some() {
            return Err(FontError::Woff(format!("重複的表格 {}", tag)));
        }
    }
    debug!("WOFF 解碼完成：{} 個表格", tables.len());
    Ok((flavor, tables))
}

fn compress_table(data: &[u8]) -> FontResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn decompress_table(data: &[u8], orig_length: usize) -> FontResult<Vec<u8>> {
    let mut table = Vec::with_capacity(orig_length);
    ZlibDecoder::new(data)
        .take(orig_length as u64 + 1)
        .read_to_end(&mut table)?;
    if table.len() != orig_length {
        return Err(FontError::Woff(format!(
            "解壓縮後長度 {} 與原始長度 {} 不符",
            table.len(),
            orig_length
        )));
    }
    Ok(table)
}
