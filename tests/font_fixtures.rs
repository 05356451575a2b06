use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use kurbo::BezPath;
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;
use write_fonts::read::tables::glyf::Glyph as ReadGlyph;
use write_fonts::read::{FontRef, TableProvider};
use write_fonts::tables::glyf::{GlyfLocaBuilder, Glyph, SimpleGlyph};
use write_fonts::tables::head::{Head, MacStyle};
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::maxp::Maxp;
use write_fonts::types::{FWord, Fixed, GlyphId, LongDateTime, Tag, UfWord};
use write_fonts::dump_table;

use font_converter::codec::font::Font;
use font_converter::codec::sfnt::TRUETYPE_VERSION;
use font_converter::config::config::OutputFormat;
use font_converter::facade::conversion_facade::ConversionFacade;
use font_converter::facade::traits::i_conversion::ConversionFacadeTrait;
use font_converter::models::conversion::ConversionJob;
use font_converter::models::event::WorkerEvent;
use font_converter::service::conversion_service::ConversionService;
use font_converter::service::font_service::FontService;
use font_converter::service::traits::i_service::ConversionServiceTrait;

const WOFF2_HEADER_SIZE: usize = 48;

fn triangle() -> SimpleGlyph {
    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((100.0, 0.0));
    path.line_to((50.0, 100.0));
    path.close_path();
    SimpleGlyph::from_bezpath(&path).unwrap()
}

/// 兩個字形（.notdef 為空、1 號為三角形）的 TrueType 表格
fn triangle_font_tables() -> BTreeMap<Tag, Vec<u8>> {
    let mut builder = GlyfLocaBuilder::new();
    builder.add_glyph(&Glyph::Empty).unwrap();
    builder.add_glyph(&triangle()).unwrap();
    let (glyf, loca, loca_format) = builder.build();

    let head = Head::new(
        Fixed::ONE,
        0,
        0,
        1000,
        LongDateTime::new(0),
        LongDateTime::new(0),
        0,
        0,
        100,
        100,
        MacStyle::empty(),
        8,
        loca_format as i16,
    );
    let hhea = Hhea {
        ascender: FWord::new(800),
        descender: FWord::new(-200),
        advance_width_max: UfWord::new(600),
        x_max_extent: FWord::new(100),
        caret_slope_rise: 1,
        number_of_h_metrics: 2,
        ..Default::default()
    };
    let hmtx = Hmtx::new(vec![LongMetric::new(500, 0), LongMetric::new(600, 0)], Vec::new());

    let mut tables = BTreeMap::new();
    tables.insert(Tag::new(b"head"), dump_table(&head).unwrap());
    tables.insert(Tag::new(b"hhea"), dump_table(&hhea).unwrap());
    tables.insert(Tag::new(b"maxp"), dump_table(&Maxp::new(2)).unwrap());
    tables.insert(Tag::new(b"glyf"), dump_table(&glyf).unwrap());
    tables.insert(Tag::new(b"loca"), dump_table(&loca).unwrap());
    tables.insert(Tag::new(b"hmtx"), dump_table(&hmtx).unwrap());
    tables
}

fn glyph_points(font_data: &[u8], glyph_id: u32) -> Vec<(i16, i16, bool)> {
    let font = FontRef::new(font_data).unwrap();
    let glyf = font.glyf().unwrap();
    let loca = font.loca(None).unwrap();
    match loca.get_glyf(GlyphId::new(glyph_id), &glyf).unwrap() {
        Some(ReadGlyph::Simple(glyph)) => glyph.points().map(|p| (p.x, p.y, p.on_curve)).collect(),
        Some(_) => panic!("glyph {} is not a simple glyph", glyph_id),
        None => Vec::new(),
    }
}

fn dispatcher() -> ConversionService {
    ConversionService::new(Box::new(FontService::new()))
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// UIntBase128，僅用於小於 2^14 的長度
fn push_base128(out: &mut Vec<u8>, value: u32) {
    if value >= 0x80 {
        out.push(0x80 | (value >> 7) as u8);
    }
    out.push((value & 0x7F) as u8);
}

fn woff2_file(num_tables: u16, directory: &[u8], compressed: &[u8]) -> Vec<u8> {
    let mut file = Vec::new();
    push_u32(&mut file, u32::from_be_bytes(*b"wOF2"));
    push_u32(&mut file, TRUETYPE_VERSION);
    push_u32(&mut file, (WOFF2_HEADER_SIZE + directory.len() + compressed.len()) as u32);
    push_u16(&mut file, num_tables);
    push_u16(&mut file, 0);
    push_u32(&mut file, 0);
    push_u32(&mut file, compressed.len() as u32);
    push_u16(&mut file, 1);
    push_u16(&mut file, 0);
    for _ in 0..5 {
        push_u32(&mut file, 0);
    }
    file.extend_from_slice(directory);
    file.extend_from_slice(compressed);
    file
}

/// 轉換後的 glyf：36 位元組標頭加七條資料流，字形同 `triangle_font_tables`
fn transformed_triangle_glyf() -> Vec<u8> {
    let n_contour = [0u8, 0, 0, 1];
    let n_points = [3u8];
    let flags = [0u8, 11, 86];
    let glyphs = [0u8, 100, 49, 99, 0];
    let bbox_bitmap = [0u8; 4];
    let mut data = Vec::new();
    push_u16(&mut data, 0); // reserved
    push_u16(&mut data, 0); // optionFlags
    push_u16(&mut data, 2); // numGlyphs
    push_u16(&mut data, 0); // indexFormat
    for size in [n_contour.len(), n_points.len(), flags.len(), glyphs.len(), 0, bbox_bitmap.len(), 0] {
        push_u32(&mut data, size as u32);
    }
    data.extend_from_slice(&n_contour);
    data.extend_from_slice(&n_points);
    data.extend_from_slice(&flags);
    data.extend_from_slice(&glyphs);
    data.extend_from_slice(&bbox_bitmap);
    data
}

fn brotli_compress(data: &[u8]) -> Vec<u8> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
    writer.write_all(data).unwrap();
    writer.into_inner()
}

/// glyf/loca 使用標準轉換的 WOFF2，其餘表格不轉換
fn transformed_woff2(tables: &BTreeMap<Tag, Vec<u8>>) -> Vec<u8> {
    let glyf = transformed_triangle_glyf();
    let mut directory = Vec::new();
    let mut stream = Vec::new();
    // 已知標籤索引：head 1、hhea 2、maxp 4、hmtx 3
    // 還原的 loca 為短格式，head 的 indexToLocFormat 需一致
    let mut head = tables[&Tag::new(b"head")].clone();
    head[50..52].copy_from_slice(&0i16.to_be_bytes());
    for (index, tag) in [(1u8, b"head"), (2, b"hhea"), (4, b"maxp"), (3, b"hmtx")] {
        let data = if tag == b"head" { &head } else { &tables[&Tag::new(tag)] };
        directory.push(index);
        push_base128(&mut directory, data.len() as u32);
        stream.extend_from_slice(data);
    }
    directory.push(10); // glyf，轉換版本 0
    push_base128(&mut directory, 20);
    push_base128(&mut directory, glyf.len() as u32);
    directory.push(11); // loca，轉換版本 0，轉換後長度為 0
    push_base128(&mut directory, 6);
    push_base128(&mut directory, 0);
    stream.extend_from_slice(&glyf);
    woff2_file(6, &directory, &brotli_compress(&stream))
}

/// 2000 個宣告長度為 u32::MAX 的表格，沒有任何壓縮資料
fn oversized_woff2() -> Vec<u8> {
    let mut directory = Vec::new();
    for _ in 0..2000 {
        directory.push(63);
        directory.extend_from_slice(b"zzzz");
        directory.extend_from_slice(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }
    woff2_file(2000, &directory, &[])
}

fn write_triangle_ttf(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let font = Font::new(TRUETYPE_VERSION, triangle_font_tables());
    fs::write(&path, font.to_bytes().unwrap()).unwrap();
    path
}

#[test]
fn outlines_survive_woff2_and_back() {
    let input_dir = tempfile::tempdir().unwrap();
    let web_dir = tempfile::tempdir().unwrap();
    let ttf_dir = tempfile::tempdir().unwrap();
    let input = write_triangle_ttf(input_dir.path(), "Triangle.ttf");
    let original = fs::read(&input).unwrap();
    assert!(!glyph_points(&original, 1).is_empty());

    let woff2 = dispatcher().convert_file(&input, OutputFormat::Woff2, web_dir.path());
    assert!(woff2.success, "{:?}", woff2.error);
    let ttf = dispatcher().convert_file(&web_dir.path().join("Triangle.woff2"), OutputFormat::Ttf, ttf_dir.path());
    assert!(ttf.success, "{:?}", ttf.error);

    let converted = fs::read(ttf_dir.path().join("Triangle.ttf")).unwrap();
    assert_eq!(glyph_points(&converted, 1), glyph_points(&original, 1));
    assert_eq!(glyph_points(&converted, 0), Vec::new());
}

#[test]
fn transformed_glyf_woff2_converts_to_ttf() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let tables = triangle_font_tables();
    let input = input_dir.path().join("Transformed.woff2");
    fs::write(&input, transformed_woff2(&tables)).unwrap();

    let result = dispatcher().convert_file(&input, OutputFormat::Ttf, output_dir.path());
    assert!(result.success, "{:?}", result.error);

    let converted = fs::read(output_dir.path().join("Transformed.ttf")).unwrap();
    assert_eq!(
        glyph_points(&converted, 1),
        vec![(0, 0, true), (100, 0, true), (50, 100, true)]
    );
    assert_eq!(glyph_points(&converted, 0), Vec::new());
    let loaded = Font::from_bytes(&converted).unwrap();
    assert_eq!(loaded.tables()[&Tag::new(b"loca")], vec![0, 0, 0, 0, 0, 10]);
    assert_eq!(loaded.tables()[&Tag::new(b"hmtx")], tables[&Tag::new(b"hmtx")]);
}

#[test]
fn oversized_lengths_fail_only_that_file() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let input = input_dir.path().join("bad.woff2");
    fs::write(&input, oversized_woff2()).unwrap();

    let result = dispatcher().convert_file(&input, OutputFormat::Ttf, output_dir.path());
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn job_with_a_corrupt_woff2_still_finishes() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let bad = input_dir.path().join("bad.woff2");
    fs::write(&bad, oversized_woff2()).unwrap();
    let good = write_triangle_ttf(input_dir.path(), "good.ttf");

    let facade = ConversionFacade::new(Arc::new(dispatcher()), Handle::current());
    let job = ConversionJob::new(vec![bad, good], OutputFormat::Woff2, output_dir.path().to_path_buf());
    let mut rx = facade.start_job(job).unwrap();
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 5);
    assert_eq!(
        events.last(),
        Some(&WorkerEvent::Finished {
            success: true,
            message: "1 out of 2 files converted successfully".into(),
        })
    );
    assert!(output_dir.path().join("good.woff2").is_file());
}
