use write_fonts::types::Tag;

use crate::codec::error::{FontError, FontResult};

/// 以大端序讀取位元組的游標，所有讀取都做邊界檢查
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        ByteReader { data, pos: 0, context }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> FontResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(FontError::Truncated(self.context))?;
        let bytes = self.data.get(self.pos..end).ok_or(FontError::Truncated(self.context))?;
        self.pos = end;
        Ok(bytes)
    }

    /// 不移動游標，取出 `start` 起長度 `len` 的片段
    pub fn slice(&self, start: usize, len: usize) -> FontResult<&'a [u8]> {
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or(FontError::Truncated(self.context))
    }

    pub fn skip(&mut self, len: usize) -> FontResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> FontResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> FontResult<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> FontResult<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> FontResult<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_tag(&mut self) -> FontResult<Tag> {
        let b = self.read_bytes(4)?;
        Ok(Tag::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// WOFF2 的 UIntBase128：最多 5 位元組，不可有前導零，不可溢位
    pub fn read_base128(&mut self) -> FontResult<u32> {
        let mut accum: u32 = 0;
        for i in 0..5 {
            let byte = self.read_u8()?;
            if i == 0 && byte == 0x80 {
                return Err(FontError::Woff2("UIntBase128 含前導零".to_string()));
            }
            if accum & 0xFE00_0000 != 0 {
                return Err(FontError::Woff2("UIntBase128 溢位".to_string()));
            }
            accum = (accum << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(accum);
            }
        }
        Err(FontError::Woff2("UIntBase128 超過 5 位元組".to_string()))
    }

    /// WOFF2 的 255UInt16 變長編碼
    pub fn read_255_u16(&mut self) -> FontResult<u16> {
        const WORD_CODE: u8 = 253;
        const ONE_MORE_BYTE_CODE2: u8 = 254;
        const ONE_MORE_BYTE_CODE1: u8 = 255;
        const LOWEST_U_CODE: u16 = 253;

        let code = self.read_u8()?;
        match code {
            WORD_CODE => self.read_u16(),
            ONE_MORE_BYTE_CODE1 => Ok(u16::from(self.read_u8()?) + LOWEST_U_CODE),
            ONE_MORE_BYTE_CODE2 => Ok(u16::from(self.read_u8()?) + LOWEST_U_CODE * 2),
            _ => Ok(u16::from(code)),
        }
    }
}

pub fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn push_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// 補零至 4 位元組邊界
pub fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// 解包後表格資料總量的上限，超過即視為損毀的檔案
pub const MAX_TABLE_DATA_SIZE: usize = 256 * 1024 * 1024;

/// 檢查檔案宣告的解包大小，避免依損毀的長度配置記憶體
pub fn check_declared_size(declared: u64, context: &'static str) -> FontResult<usize> {
    if declared > MAX_TABLE_DATA_SIZE as u64 {
        return Err(FontError::TooLarge { context, declared });
    }
    Ok(declared as usize)
}

pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// 計算 sfnt 表格校驗和；`head` 表的 checkSumAdjustment 欄位視為 0
pub fn table_checksum(tag: Tag, data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    for (index, chunk) in data.chunks(4).enumerate() {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        if tag == Tag::new(b"head") && index == 2 {
            continue;
        }
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

/// UIntBase128 編碼
pub fn push_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}
