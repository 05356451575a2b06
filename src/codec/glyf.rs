//! WOFF2 轉換後 `glyf`/`loca` 與 `hmtx` 表格的還原。
//!
//! 轉換後的 glyf 將字形資料拆成七條資料流（輪廓數、點數、旗標、座標三元組、
//! 組合字形、邊界框、指令），這裡逐一讀出並組回標準 TrueType 字形與 loca 偏移。

use crate::codec::error::{FontError, FontResult};
use crate::codec::reader::{pad4, push_i16, push_u16, push_u32, ByteReader};

const GLYF_HEADER_SIZE: usize = 36;
const OVERLAP_SIMPLE_BITMAP: u16 = 1 << 0;

// 簡單字形旗標
const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;
const OVERLAP_SIMPLE: u8 = 0x40;

// 組合字形旗標
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

/// 還原後的 glyf 與 loca
#[derive(Debug)]
pub struct ReconstructedGlyf {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub num_glyphs: u16,
    /// 每個字形的 xMin，供 hmtx 還原左側間距
    pub x_mins: Vec<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: i32,
    y: i32,
    on_curve: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct BBox {
    x_min: i16,
    y_min: i16,
    x_max: i16,
    y_max: i16,
}

impl BBox {
    fn read(stream: &mut ByteReader) -> FontResult<Self> {
        Ok(BBox {
            x_min: stream.read_i16()?,
            y_min: stream.read_i16()?,
            x_max: stream.read_i16()?,
            y_max: stream.read_i16()?,
        })
    }

    fn from_points(points: &[Point]) -> FontResult<Self> {
        let Some(first) = points.first() else {
            return Ok(BBox::default());
        };
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
        for p in points {
            x_min = x_min.min(p.x);
            y_min = y_min.min(p.y);
            x_max = x_max.max(p.x);
            y_max = y_max.max(p.y);
        }
        Ok(BBox {
            x_min: to_i16(x_min)?,
            y_min: to_i16(y_min)?,
            x_max: to_i16(x_max)?,
            y_max: to_i16(y_max)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        push_i16(out, self.x_min);
        push_i16(out, self.y_min);
        push_i16(out, self.x_max);
        push_i16(out, self.y_max);
    }
}

struct Streams<'a> {
    n_contour: ByteReader<'a>,
    n_points: ByteReader<'a>,
    flags: ByteReader<'a>,
    glyphs: ByteReader<'a>,
    composites: ByteReader<'a>,
    bbox_bitmap: &'a [u8],
    bboxes: ByteReader<'a>,
    instructions: ByteReader<'a>,
    overlap_bitmap: Option<&'a [u8]>,
}

fn bit_is_set(bitmap: &[u8], index: usize) -> bool {
    bitmap
        .get(index >> 3)
        .map(|byte| byte & (0x80 >> (index & 7)) != 0)
        .unwrap_or(false)
}

fn to_i16(value: i32) -> FontResult<i16> {
    i16::try_from(value).map_err(|_| FontError::Woff2(format!("座標 {} 超出 int16 範圍", value)))
}

/// 還原轉換後的 glyf 資料，`index_format` 以轉換標頭為準
///
/// 標頭共 36 位元組：reserved、optionFlags、numGlyphs、indexFormat 各 16 位元，
/// 之後是七條資料流的 32 位元長度。
pub fn reconstruct_glyf(data: &[u8]) -> FontResult<ReconstructedGlyf> {
    let mut header = ByteReader::new(data, "glyf 轉換標頭");
    let _reserved = header.read_u16()?;
    let option_flags = header.read_u16()?;
    let num_glyphs = header.read_u16()?;
    let index_format = header.read_u16()?;
    let mut sizes = [0usize; 7];
    for size in sizes.iter_mut() {
        *size = header.read_u32()? as usize;
    }

    let mut body = ByteReader::new(data, "glyf 資料流");
    body.skip(GLYF_HEADER_SIZE)?;
    let n_contour = body.read_bytes(sizes[0])?;
    let n_points = body.read_bytes(sizes[1])?;
    let flags = body.read_bytes(sizes[2])?;
    let glyphs = body.read_bytes(sizes[3])?;
    let composites = body.read_bytes(sizes[4])?;
    let bbox_stream = body.read_bytes(sizes[5])?;
    let instructions = body.read_bytes(sizes[6])?;
    let overlap_bitmap = if option_flags & OVERLAP_SIMPLE_BITMAP != 0 {
        Some(body.read_bytes((num_glyphs as usize + 7) / 8)?)
    } else {
        None
    };

    let bitmap_len = 4 * ((num_glyphs as usize + 31) / 32);
    if bbox_stream.len() < bitmap_len {
        return Err(FontError::Truncated("glyf 邊界框點陣圖"));
    }
    let (bbox_bitmap, bbox_values) = bbox_stream.split_at(bitmap_len);

    let mut streams = Streams {
        n_contour: ByteReader::new(n_contour, "輪廓數資料流"),
        n_points: ByteReader::new(n_points, "點數資料流"),
        flags: ByteReader::new(flags, "旗標資料流"),
        glyphs: ByteReader::new(glyphs, "字形資料流"),
        composites: ByteReader::new(composites, "組合字形資料流"),
        bbox_bitmap,
        bboxes: ByteReader::new(bbox_values, "邊界框資料流"),
        instructions: ByteReader::new(instructions, "指令資料流"),
        overlap_bitmap,
    };

    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(num_glyphs as usize + 1);
    let mut x_mins = Vec::with_capacity(num_glyphs as usize);
    for glyph_id in 0..num_glyphs as usize {
        offsets.push(glyf.len());
        let x_min = write_glyph(&mut streams, glyph_id, &mut glyf)?;
        x_mins.push(x_min);
        pad4(&mut glyf);
    }
    offsets.push(glyf.len());

    let loca = build_loca(&offsets, index_format)?;
    Ok(ReconstructedGlyf { glyf, loca, num_glyphs, x_mins })
}

fn build_loca(offsets: &[usize], index_format: u16) -> FontResult<Vec<u8>> {
    let mut loca = Vec::new();
    match index_format {
        0 => {
            for &offset in offsets {
                let half = u16::try_from(offset / 2)
                    .map_err(|_| FontError::Woff2("glyf 太大，無法使用短 loca 格式".to_string()))?;
                push_u16(&mut loca, half);
            }
        }
        1 => {
            for &offset in offsets {
                push_u32(&mut loca, offset as u32);
            }
        }
        other => return Err(FontError::Woff2(format!("未知的 loca 格式 {}", other))),
    }
    Ok(loca)
}

/// 寫出單一字形，回傳其 xMin
fn write_glyph(streams: &mut Streams, glyph_id: usize, out: &mut Vec<u8>) -> FontResult<i16> {
    let n_contours = streams.n_contour.read_i16()?;
    let has_bbox = bit_is_set(streams.bbox_bitmap, glyph_id);
    match n_contours {
        0 => {
            if has_bbox {
                return Err(FontError::Woff2(format!("空字形 {} 不應帶有邊界框", glyph_id)));
            }
            Ok(0)
        }
        -1 => {
            if !has_bbox {
                return Err(FontError::Woff2(format!("組合字形 {} 缺少邊界框", glyph_id)));
            }
            let (components, have_instructions) = read_composite(&mut streams.composites)?;
            let bbox = BBox::read(&mut streams.bboxes)?;
            push_i16(out, -1);
            bbox.write(out);
            out.extend_from_slice(components);
            if have_instructions {
                let len = streams.glyphs.read_255_u16()?;
                push_u16(out, len);
                out.extend_from_slice(streams.instructions.read_bytes(len as usize)?);
            }
            Ok(bbox.x_min)
        }
        n if n > 0 => {
            let overlap = streams
                .overlap_bitmap
                .map(|bitmap| bit_is_set(bitmap, glyph_id))
                .unwrap_or(false);
            write_simple_glyph(streams, n as usize, has_bbox, overlap, out)
        }
        n => Err(FontError::Woff2(format!("字形 {} 的輪廓數 {} 無效", glyph_id, n))),
    }
}

fn read_composite<'a>(stream: &mut ByteReader<'a>) -> FontResult<(&'a [u8], bool)> {
    let start = stream.position();
    let mut have_instructions = false;
    loop {
        let flags = stream.read_u16()?;
        let _glyph_index = stream.read_u16()?;
        let mut size = if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            size += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            size += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            size += 8;
        }
        stream.skip(size)?;
        have_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    let len = stream.position() - start;
    Ok((stream.slice(start, len)?, have_instructions))
}

fn write_simple_glyph(
    streams: &mut Streams,
    n_contours: usize,
    has_bbox: bool,
    overlap: bool,
    out: &mut Vec<u8>,
) -> FontResult<i16> {
    let mut end_points = Vec::with_capacity(n_contours);
    let mut total_points: u32 = 0;
    for _ in 0..n_contours {
        total_points += u32::from(streams.n_points.read_255_u16()?);
        if total_points > 0xFFFF {
            return Err(FontError::Woff2("字形點數超過 65535".to_string()));
        }
        end_points.push((total_points as u16).wrapping_sub(1));
    }

    let points = decode_triplets(&mut streams.flags, &mut streams.glyphs, total_points as usize)?;
    let instruction_len = streams.glyphs.read_255_u16()?;
    let instructions = streams.instructions.read_bytes(instruction_len as usize)?;
    let bbox = if has_bbox {
        BBox::read(&mut streams.bboxes)?
    } else {
        BBox::from_points(&points)?
    };

    push_i16(out, n_contours as i16);
    bbox.write(out);
    for end in &end_points {
        push_u16(out, *end);
    }
    push_u16(out, instruction_len);
    out.extend_from_slice(instructions);
    write_points(&points, overlap, out)?;
    Ok(bbox.x_min)
}

fn with_sign(flag: u8, base: i32) -> i32 {
    if flag & 1 != 0 {
        base
    } else {
        -base
    }
}

/// 解碼座標三元組；旗標最高位元為 0 表示曲線上的點
fn decode_triplets(
    flags: &mut ByteReader,
    glyphs: &mut ByteReader,
    count: usize,
) -> FontResult<Vec<Point>> {
    let mut points = Vec::with_capacity(count);
    let (mut x, mut y) = (0i32, 0i32);
    for _ in 0..count {
        let raw = flags.read_u8()?;
        let on_curve = raw >> 7 == 0;
        let flag = raw & 0x7F;
        let (dx, dy) = if flag < 10 {
            let b0 = i32::from(glyphs.read_u8()?);
            (0, with_sign(flag, (i32::from(flag & 14) << 7) + b0))
        } else if flag < 20 {
            let b0 = i32::from(glyphs.read_u8()?);
            (with_sign(flag, (i32::from((flag - 10) & 14) << 7) + b0), 0)
        } else if flag < 84 {
            let b0 = i32::from(flag - 20);
            let b1 = i32::from(glyphs.read_u8()?);
            (
                with_sign(flag, 1 + (b0 & 0x30) + (b1 >> 4)),
                with_sign(flag >> 1, 1 + ((b0 & 0x0C) << 2) + (b1 & 0x0F)),
            )
        } else if flag < 120 {
            let b0 = i32::from(flag - 84);
            let bytes = glyphs.read_bytes(2)?;
            (
                with_sign(flag, 1 + ((b0 / 12) << 8) + i32::from(bytes[0])),
                with_sign(flag >> 1, 1 + (((b0 % 12) >> 2) << 8) + i32::from(bytes[1])),
            )
        } else if flag < 124 {
            let bytes = glyphs.read_bytes(3)?;
            let b2 = i32::from(bytes[1]);
            (
                with_sign(flag, (i32::from(bytes[0]) << 4) + (b2 >> 4)),
                with_sign(flag >> 1, ((b2 & 0x0F) << 8) + i32::from(bytes[2])),
            )
        } else {
            let bytes = glyphs.read_bytes(4)?;
            (
                with_sign(flag, (i32::from(bytes[0]) << 8) + i32::from(bytes[1])),
                with_sign(flag >> 1, (i32::from(bytes[2]) << 8) + i32::from(bytes[3])),
            )
        };
        x += dx;
        y += dy;
        points.push(Point { x, y, on_curve });
    }
    Ok(points)
}

/// 以標準 TrueType 旗標寫出點座標，小位移使用單位元組
fn write_points(points: &[Point], overlap: bool, out: &mut Vec<u8>) -> FontResult<()> {
    let mut flags = Vec::with_capacity(points.len());
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let (mut last_x, mut last_y) = (0i32, 0i32);
    for (index, point) in points.iter().enumerate() {
        let mut flag = if point.on_curve { ON_CURVE } else { 0 };
        if index == 0 && overlap {
            flag |= OVERLAP_SIMPLE;
        }
        let dx = point.x - last_x;
        let dy = point.y - last_y;
        flag |= encode_delta(dx, X_SHORT, X_SAME_OR_POSITIVE, &mut xs)?;
        flag |= encode_delta(dy, Y_SHORT, Y_SAME_OR_POSITIVE, &mut ys)?;
        flags.push(flag);
        last_x = point.x;
        last_y = point.y;
    }
    out.extend_from_slice(&flags);
    out.extend_from_slice(&xs);
    out.extend_from_slice(&ys);
    Ok(())
}

fn encode_delta(delta: i32, short: u8, same_or_positive: u8, out: &mut Vec<u8>) -> FontResult<u8> {
    if delta == 0 {
        Ok(same_or_positive)
    } else if delta.abs() < 256 {
        out.push(delta.unsigned_abs() as u8);
        Ok(if delta > 0 { short | same_or_positive } else { short })
    } else {
        push_i16(out, to_i16(delta)?);
        Ok(0)
    }
}

/// 還原轉換後的 hmtx；省略的左側間距取自字形 xMin
pub fn reconstruct_hmtx(
    data: &[u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    x_mins: &[i16],
) -> FontResult<Vec<u8>> {
    let num_glyphs = num_glyphs as usize;
    let num_h_metrics = num_h_metrics as usize;
    if num_h_metrics == 0 || num_h_metrics > num_glyphs || x_mins.len() != num_glyphs {
        return Err(FontError::Woff2(format!(
            "hmtx 度量數 {} 與字形數 {} 不符",
            num_h_metrics, num_glyphs
        )));
    }

    let mut stream = ByteReader::new(data, "hmtx 轉換資料");
    let flags = stream.read_u8()?;
    if flags & 0xFC != 0 || flags & 0x03 == 0 {
        return Err(FontError::Woff2(format!("hmtx 轉換旗標無效：0x{:02X}", flags)));
    }
    let mut advances = Vec::with_capacity(num_h_metrics);
    for _ in 0..num_h_metrics {
        advances.push(stream.read_u16()?);
    }
    let mut lsbs = Vec::with_capacity(num_glyphs);
    if flags & 0x01 == 0 {
        for _ in 0..num_h_metrics {
            lsbs.push(stream.read_i16()?);
        }
    } else {
        lsbs.extend_from_slice(&x_mins[..num_h_metrics]);
    }
    if flags & 0x02 == 0 {
        for _ in num_h_metrics..num_glyphs {
            lsbs.push(stream.read_i16()?);
        }
    } else {
        lsbs.extend_from_slice(&x_mins[num_h_metrics..]);
    }

    let mut hmtx = Vec::with_capacity(num_h_metrics * 4 + (num_glyphs - num_h_metrics) * 2);
    for (index, lsb) in lsbs.iter().enumerate() {
        if let Some(advance) = advances.get(index) {
            push_u16(&mut hmtx, *advance);
        }
        push_i16(&mut hmtx, *lsb);
    }
    Ok(hmtx)
}
