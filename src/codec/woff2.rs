use std::collections::BTreeMap;
use std::io::{Read, Write};

use log::debug;
use write_fonts::types::Tag;

use crate::codec::error::{FontError, FontResult};
use crate::codec::glyf::{reconstruct_glyf, reconstruct_hmtx};
use crate::codec::reader::{check_declared_size, pad4, push_base128, push_u16, push_u32, ByteReader};
use crate::codec::sfnt::{font_revision, total_sfnt_size};

pub const WOFF2_SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");
const COLLECTION_FLAVOR: u32 = u32::from_be_bytes(*b"ttcf");
const HEADER_SIZE: usize = 48;
const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;
const ARBITRARY_TAG_INDEX: u8 = 63;

const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");
const HMTX: Tag = Tag::new(b"hmtx");
const HHEA: Tag = Tag::new(b"hhea");

/// WOFF2 表格目錄中以索引表示的常見標籤
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

fn known_tag_index(tag: Tag) -> Option<u8> {
    KNOWN_TAGS
        .iter()
        .position(|known| Tag::new(known) == tag)
        .map(|index| index as u8)
}

/// 目錄中的表格順序：依標籤排序，但 loca 緊接在 glyf 之後
fn directory_order(tables: &BTreeMap<Tag, Vec<u8>>) -> Vec<Tag> {
    let mut order: Vec<Tag> = tables.keys().copied().filter(|tag| *tag != LOCA).collect();
    if tables.contains_key(&LOCA) {
        match order.iter().position(|tag| *tag == GLYF) {
            Some(glyf) => order.insert(glyf + 1, LOCA),
            None => {
                order.push(LOCA);
                order.sort();
            }
        }
    }
    order
}

/// 將表格打包為 WOFF2。所有表格採用空轉換（glyf/loca 轉換版本 3），
/// 依目錄順序串接後以單一 Brotli 串流壓縮。
pub fn encode(sfnt_version: u32, tables: &BTreeMap<Tag, Vec<u8>>) -> FontResult<Vec<u8>> {
    let order = directory_order(tables);
    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for tag in &order {
        let data = &tables[tag];
        let transform_version: u8 = if *tag == GLYF || *tag == LOCA { 3 } else { 0 };
        match known_tag_index(*tag) {
            Some(index) => directory.push(index | (transform_version << 6)),
            None => {
                directory.push(ARBITRARY_TAG_INDEX | (transform_version << 6));
                directory.extend_from_slice(&tag.to_be_bytes());
            }
        }
        push_base128(&mut directory, data.len() as u32);
        stream.extend_from_slice(data);
    }

    let compressed = compress(&stream)?;
    let mut out = Vec::with_capacity(HEADER_SIZE + directory.len() + compressed.len() + 3);
    let total_length = {
        let unpadded = HEADER_SIZE + directory.len() + compressed.len();
        (unpadded + 3) & !3
    };
    let (major, minor) = font_revision(tables);
    push_u32(&mut out, WOFF2_SIGNATURE);
    push_u32(&mut out, sfnt_version);
    push_u32(&mut out, total_length as u32);
    push_u16(&mut out, order.len() as u16);
    push_u16(&mut out, 0);
    push_u32(&mut out, total_sfnt_size(tables));
    push_u32(&mut out, compressed.len() as u32);
    push_u16(&mut out, major);
    push_u16(&mut out, minor);
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    for _ in 0..5 {
        push_u32(&mut out, 0);
    }
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    pad4(&mut out);
    debug!(
        "WOFF2 編碼完成：{} 個表格，原始 {} 位元組，壓縮後 {} 位元組",
        order.len(),
        stream.len(),
        compressed.len()
    );
    Ok(out)
}

struct DirectoryEntry {
    tag: Tag,
    transform_version: u8,
    orig_length: u32,
    /// 在解壓縮串流中的位置
    offset: usize,
    length: usize,
}

impl DirectoryEntry {
    fn is_transformed(&self) -> bool {
        if self.tag == GLYF || self.tag == LOCA {
            self.transform_version != 3
        } else {
            self.transform_version != 0
        }
    }
}

fn read_directory(reader: &mut ByteReader, num_tables: usize) -> FontResult<Vec<DirectoryEntry>> {
    let mut entries = Vec::with_capacity(num_tables);
    let mut offset = 0usize;
    for _ in 0..num_tables {
        let flags = reader.read_u8()?;
        let tag_index = flags & 0x3F;
        let transform_version = flags >> 6;
        let tag = if tag_index == ARBITRARY_TAG_INDEX {
            reader.read_tag()?
        } else {
            Tag::new(KNOWN_TAGS[tag_index as usize])
        };
        let orig_length = reader.read_base128()?;
        let mut entry = DirectoryEntry {
            tag,
            transform_version,
            orig_length,
            offset,
            length: orig_length as usize,
        };
        if entry.is_transformed() {
            entry.length = reader.read_base128()? as usize;
            if tag == LOCA && entry.length != 0 {
                return Err(FontError::Woff2("轉換後的 loca 長度必須為 0".to_string()));
            }
        }
        offset = offset
            .checked_add(entry.length)
            .ok_or_else(|| FontError::Woff2("表格長度溢位".to_string()))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// 解開 WOFF2，包含轉換後的 glyf/loca 與 hmtx
pub fn decode(data: &[u8]) -> FontResult<(u32, BTreeMap<Tag, Vec<u8>>)> {
    let mut reader = ByteReader::new(data, "WOFF2 標頭");
    if reader.read_u32()? != WOFF2_SIGNATURE {
        return Err(FontError::Woff2("簽章不符".to_string()));
    }
    let flavor = reader.read_u32()?;
    if flavor == COLLECTION_FLAVOR {
        return Err(FontError::Collection);
    }
    let length = reader.read_u32()? as usize;
    let num_tables = reader.read_u16()? as usize;
    let _reserved = reader.read_u16()?;
    let _total_sfnt_size = reader.read_u32()?;
    let total_compressed_size = reader.read_u32()? as usize;
    reader.skip(HEADER_SIZE - reader.position())?;
    if length > data.len() {
        return Err(FontError::Woff2(format!("標頭長度 {} 大於檔案大小 {}", length, data.len())));
    }

    let entries = read_directory(&mut reader, num_tables)?;
    let declared: u64 = entries.iter().map(|e| u64::from(e.orig_length).max(e.length as u64)).sum();
    check_declared_size(declared, "WOFF2 表格")?;
    let compressed = reader.read_bytes(total_compressed_size)?;
    let expected: usize = entries.iter().map(|e| e.length).sum();
    let stream = decompress(compressed, expected)?;

    let mut tables = BTreeMap::new();
    let mut glyph_x_mins = None;
    for entry in entries.iter().filter(|e| e.tag != HMTX || !e.is_transformed()) {
        if !entry.is_transformed() {
            tables.insert(entry.tag, table_bytes(&stream, entry)?.to_vec());
            continue;
        }
        match entry.tag {
            GLYF if entry.transform_version == 0 => {
                let rebuilt = reconstruct_glyf(table_bytes(&stream, entry)?)?;
                let loca = entries
                    .iter()
                    .find(|e| e.tag == LOCA)
                    .ok_or_else(|| FontError::Woff2("轉換後的 glyf 缺少 loca".to_string()))?;
                if !loca.is_transformed() {
                    return Err(FontError::Woff2("glyf 與 loca 的轉換狀態不一致".to_string()));
                }
                if rebuilt.loca.len() != loca.orig_length as usize {
                    debug!(
                        "還原的 loca 長度 {} 與目錄宣告 {} 不同",
                        rebuilt.loca.len(),
                        loca.orig_length
                    );
                }
                tables.insert(GLYF, rebuilt.glyf);
                tables.insert(LOCA, rebuilt.loca);
                glyph_x_mins = Some((rebuilt.num_glyphs, rebuilt.x_mins));
            }
            LOCA if entry.transform_version == 0 => {
                let glyf_transformed = entries.iter().any(|e| e.tag == GLYF && e.is_transformed());
                if !glyf_transformed {
                    return Err(FontError::Woff2("glyf 與 loca 的轉換狀態不一致".to_string()));
                }
            }
            tag => {
                return Err(FontError::Woff2(format!(
                    "不支援表格 {} 的轉換版本 {}",
                    tag, entry.transform_version
                )))
            }
        }
    }

    if let Some(entry) = entries.iter().find(|e| e.tag == HMTX && e.is_transformed()) {
        if entry.transform_version != 1 {
            return Err(FontError::Woff2(format!("不支援 hmtx 轉換版本 {}", entry.transform_version)));
        }
        let (num_glyphs, x_mins) = glyph_x_mins
            .as_ref()
            .ok_or_else(|| FontError::Woff2("轉換後的 hmtx 需要轉換後的 glyf".to_string()))?;
        let hhea = tables
            .get(&HHEA)
            .filter(|hhea| hhea.len() >= 36)
            .ok_or(FontError::Truncated("hhea 表格"))?;
        let num_h_metrics = u16::from_be_bytes([hhea[34], hhea[35]]);
        let hmtx = reconstruct_hmtx(table_bytes(&stream, entry)?, *num_glyphs, num_h_metrics, x_mins)?;
        tables.insert(HMTX, hmtx);
    }

    debug!("WOFF2 解碼完成：{} 個表格", tables.len());
    Ok((flavor, tables))
}

fn table_bytes<'s>(stream: &'s [u8], entry: &DirectoryEntry) -> FontResult<&'s [u8]> {
    stream
        .get(entry.offset..entry.offset + entry.length)
        .ok_or(FontError::Truncated("WOFF2 解壓縮串流"))
}

fn compress(data: &[u8]) -> FontResult<Vec<u8>> {
    let mut writer =
        brotli::CompressorWriter::new(Vec::new(), BROTLI_BUFFER_SIZE, BROTLI_QUALITY, BROTLI_WINDOW);
    writer.write_all(data)?;
    Ok(writer.into_inner())
}

fn decompress(data: &[u8], expected: usize) -> FontResult<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    brotli::Decompressor::new(data, BROTLI_BUFFER_SIZE)
        .take(expected as u64 + 1)
        .read_to_end(&mut out)?;
    if out.len() != expected {
        return Err(FontError::Woff2(format!(
            "解壓縮後長度 {} 與目錄總和 {} 不符",
            out.len(),
            expected
        )));
    }
    Ok(out)
}
