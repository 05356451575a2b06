use std::collections::BTreeMap;
use std::fmt;

use write_fonts::types::Tag;

use crate::codec::error::{FontError, FontResult};
use crate::codec::{sfnt, woff, woff2};

/// 網頁字型包裝方式；`None` 代表未包裝的 sfnt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Woff,
    Woff2,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Woff => write!(f, "woff"),
            Flavor::Woff2 => write!(f, "woff2"),
        }
    }
}

/// 已載入記憶體的字型：sfnt 版本、表格與目前的包裝方式
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    sfnt_version: u32,
    tables: BTreeMap<Tag, Vec<u8>>,
    flavor: Option<Flavor>,
}

impl Font {
    pub fn new(sfnt_version: u32, tables: BTreeMap<Tag, Vec<u8>>) -> Self {
        Font { sfnt_version, tables, flavor: None }
    }

    /// 依檔頭簽章判斷格式並載入
    pub fn from_bytes(data: &[u8]) -> FontResult<Self> {
        let signature: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or(FontError::Truncated("字型檔頭"))?;
        let (sfnt_version, tables, flavor) = match &signature {
            b"wOFF" => {
                let (version, tables) = woff::decode(data)?;
                (version, tables, Some(Flavor::Woff))
            }
            b"wOF2" => {
                let (version, tables) = woff2::decode(data)?;
                (version, tables, Some(Flavor::Woff2))
            }
            b"ttcf" => return Err(FontError::Collection),
            _ if is_sfnt_version(u32::from_be_bytes(signature)) => {
                let (version, tables) = sfnt::decode(data)?;
                (version, tables, None)
            }
            _ => return Err(FontError::UnknownFormat(signature)),
        };
        Ok(Font { sfnt_version, tables, flavor })
    }

    /// 依目前的包裝方式序列化
    pub fn to_bytes(&self) -> FontResult<Vec<u8>> {
        match self.flavor {
            None => Ok(sfnt::encode(self.sfnt_version, &self.tables)),
            Some(Flavor::Woff) => woff::encode(self.sfnt_version, &self.tables),
            Some(Flavor::Woff2) => woff2::encode(self.sfnt_version, &self.tables),
        }
    }

    pub fn flavor(&self) -> Option<Flavor> {
        self.flavor
    }

    pub fn set_flavor(&mut self, flavor: Option<Flavor>) {
        self.flavor = flavor;
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn tables(&self) -> &BTreeMap<Tag, Vec<u8>> {
        &self.tables
    }
}

fn is_sfnt_version(version: u32) -> bool {
    matches!(
        version,
        sfnt::TRUETYPE_VERSION | sfnt::CFF_VERSION | sfnt::APPLE_TRUE_VERSION
    )
}
