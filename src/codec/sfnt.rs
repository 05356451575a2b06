use std::collections::BTreeMap;

use log::debug;
use write_fonts::read::FontRef;
use write_fonts::types::Tag;
use write_fonts::FontBuilder;

use crate::codec::error::{FontError, FontResult};
use crate::codec::reader::padded_len;

pub const TRUETYPE_VERSION: u32 = 0x0001_0000;
pub const CFF_VERSION: u32 = u32::from_be_bytes(*b"OTTO");
pub const APPLE_TRUE_VERSION: u32 = u32::from_be_bytes(*b"true");

/// 解析未包裝的 sfnt（TTF/OTF），回傳 sfnt 版本與所有表格
pub fn decode(data: &[u8]) -> FontResult<(u32, BTreeMap<Tag, Vec<u8>>)> {
    let font = FontRef::new(data)?;
    let sfnt_version = font.table_directory.sfnt_version();
    let mut tables = BTreeMap::new();
    for record in font.table_directory.table_records() {
        let tag = record.tag();
        let table = font
            .table_data(tag)
            .ok_or(FontError::Truncated("sfnt 表格超出檔案範圍"))?;
        tables.insert(tag, table.as_bytes().to_vec());
    }
    debug!("解析 sfnt：版本 0x{:08X}，{} 個表格", sfnt_version, tables.len());
    Ok((sfnt_version, tables))
}

/// 將表格組裝為未包裝的 sfnt，標頭寫入給定的 sfnt 版本
pub fn encode(sfnt_version: u32, tables: &BTreeMap<Tag, Vec<u8>>) -> Vec<u8> {
    let mut builder = FontBuilder::new();
    for (tag, data) in tables {
        builder.add_raw(*tag, data.as_slice());
    }
    let mut bytes = builder.build();
    if sfnt_version != TRUETYPE_VERSION {
        set_sfnt_version(&mut bytes, sfnt_version);
    }
    bytes
}

// FontBuilder 一律寫入 0x00010000；改寫版本後整檔總和同步變動，checkSumAdjustment 需跟著修正
fn set_sfnt_version(bytes: &mut [u8], sfnt_version: u32) {
    let written = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    bytes[..4].copy_from_slice(&sfnt_version.to_be_bytes());
    let num_tables = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
    for index in 0..num_tables {
        let record = 12 + 16 * index;
        if bytes[record..record + 4] != *b"head" {
            continue;
        }
        let offset = u32::from_be_bytes([
            bytes[record + 8],
            bytes[record + 9],
            bytes[record + 10],
            bytes[record + 11],
        ]) as usize;
        let length = u32::from_be_bytes([
            bytes[record + 12],
            bytes[record + 13],
            bytes[record + 14],
            bytes[record + 15],
        ]) as usize;
        if length < 12 {
            return;
        }
        let field = offset + 8..offset + 12;
        let mut adjustment = [0u8; 4];
        adjustment.copy_from_slice(&bytes[field.clone()]);
        let adjustment = u32::from_be_bytes(adjustment).wrapping_sub(sfnt_version.wrapping_sub(written));
        bytes[field].copy_from_slice(&adjustment.to_be_bytes());
        return;
    }
}

/// 未包裝 sfnt 的總大小（標頭、表格目錄與 4 位元組對齊的表格資料）
pub fn total_sfnt_size(tables: &BTreeMap<Tag, Vec<u8>>) -> u32 {
    let data: usize = tables.values().map(|t| padded_len(t.len())).sum();
    (12 + 16 * tables.len() + data) as u32
}

/// 由 `head` 表的 fontRevision 推導 WOFF 標頭中的主次版本號
pub fn font_revision(tables: &BTreeMap<Tag, Vec<u8>>) -> (u16, u16) {
    match tables.get(&Tag::new(b"head")) {
        Some(head) if head.len() >= 8 => (
            u16::from_be_bytes([head[4], head[5]]),
            u16::from_be_bytes([head[6], head[7]]),
        ),
        _ => (0, 0),
    }
}
