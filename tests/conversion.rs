use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};

use pretty_assertions::assert_eq;
use rand::Rng;
use tokio::runtime::Handle;
use write_fonts::types::Tag;

use font_converter::codec::font::{Flavor, Font};
use font_converter::codec::sfnt::{CFF_VERSION, TRUETYPE_VERSION};
use font_converter::config::config::OutputFormat;
use font_converter::facade::conversion_facade::ConversionFacade;
use font_converter::facade::traits::i_conversion::ConversionFacadeTrait;
use font_converter::models::conversion::{ConversionJob, ConversionResult, JobState};
use font_converter::models::event::{EventReceiver, WorkerEvent};
use font_converter::service::conversion_service::ConversionService;
use font_converter::service::font_service::FontService;
use font_converter::service::traits::i_service::ConversionServiceTrait;

fn random_tables() -> BTreeMap<Tag, Vec<u8>> {
    let mut rng = rand::rng();
    let mut tables = BTreeMap::new();
    for tag in [b"cmap", b"name", b"post", b"OS/2", b"zzzz"] {
        let len = rng.random_range(1..600);
        let data: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        tables.insert(Tag::new(tag), data);
    }
    tables
}

fn write_font(dir: &Path, name: &str, sfnt_version: u32, flavor: Option<Flavor>) -> (PathBuf, Font) {
    let mut font = Font::new(sfnt_version, random_tables());
    font.set_flavor(flavor);
    let path = dir.join(name);
    fs::write(&path, font.to_bytes().unwrap()).unwrap();
    (path, font)
}

fn dispatcher() -> ConversionService {
    ConversionService::new(Box::new(FontService::new()))
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn collect_events(mut rx: EventReceiver) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[test]
fn ttf_to_ttf_is_a_byte_identical_copy() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (input, _) = write_font(input_dir.path(), "Sample.TTF", TRUETYPE_VERSION, None);

    let result = dispatcher().convert_file(&input, OutputFormat::Ttf, output_dir.path());
    let output = output_dir.path().join("Sample.ttf");
    assert_eq!(result, ConversionResult::succeeded(&input, output.clone()));
    assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
}

#[test]
fn web_fonts_convert_back_to_bare_ttf() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (input, font) = write_font(input_dir.path(), "web.woff2", TRUETYPE_VERSION, Some(Flavor::Woff2));

    assert!(dispatcher().convert_file(&input, OutputFormat::Ttf, output_dir.path()).success);
    let loaded = Font::from_bytes(&fs::read(output_dir.path().join("web.ttf")).unwrap()).unwrap();
    assert_eq!(loaded.flavor(), None);
    assert_eq!(loaded.tables(), font.tables());
}

#[test]
fn otf_and_eot_targets_fall_back_to_ttf() {
    let input_dir = tempfile::tempdir().unwrap();
    let (input, font) = write_font(input_dir.path(), "Face.woff", TRUETYPE_VERSION, Some(Flavor::Woff));

    for format in [OutputFormat::Otf, OutputFormat::Eot] {
        let output_dir = tempfile::tempdir().unwrap();
        let result = dispatcher().convert_file(&input, format, output_dir.path());
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.output, Some(output_dir.path().join("Face.ttf")));
        assert_eq!(list_dir(output_dir.path()), vec!["Face.ttf".to_string()]);
        let loaded = Font::from_bytes(&fs::read(output_dir.path().join("Face.ttf")).unwrap()).unwrap();
        assert_eq!(loaded.tables(), font.tables());
    }
}

#[test]
fn otf_input_is_copied_for_otf_target() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (input, _) = write_font(input_dir.path(), "Cff.otf", CFF_VERSION, None);

    let result = dispatcher().convert_file(&input, OutputFormat::Otf, output_dir.path());
    assert!(result.success);
    assert_eq!(
        fs::read(output_dir.path().join("Cff.otf")).unwrap(),
        fs::read(&input).unwrap()
    );
}

#[test]
fn eot_target_on_ttf_input_is_a_copy_named_ttf() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (input, _) = write_font(input_dir.path(), "Plain.ttf", TRUETYPE_VERSION, None);

    assert!(dispatcher().convert_file(&input, OutputFormat::Eot, output_dir.path()).success);
    assert_eq!(list_dir(output_dir.path()), vec!["Plain.ttf".to_string()]);
    assert_eq!(
        fs::read(output_dir.path().join("Plain.ttf")).unwrap(),
        fs::read(&input).unwrap()
    );
}

#[test]
fn web_font_outputs_reload_with_the_same_tables() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (input, font) = write_font(input_dir.path(), "Random.ttf", TRUETYPE_VERSION, None);

    for (format, flavor) in [(OutputFormat::Woff, Flavor::Woff), (OutputFormat::Woff2, Flavor::Woff2)] {
        let result = dispatcher().convert_file(&input, format, output_dir.path());
        let output = output_dir.path().join(format!("Random.{}", format.extension()));
        assert_eq!(result.output, Some(output.clone()));
        let loaded = Font::from_bytes(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(loaded.flavor(), Some(flavor));
        assert_eq!(loaded.sfnt_version(), TRUETYPE_VERSION);
        assert_eq!(loaded.tables(), font.tables());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn facade_reports_partial_success() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (good, _) = write_font(input_dir.path(), "good.ttf", TRUETYPE_VERSION, None);
    let broken = input_dir.path().join("broken.otf");
    fs::write(&broken, b"not a font at all").unwrap();

    let facade = ConversionFacade::new(Arc::new(dispatcher()), Handle::current());
    let job = ConversionJob::new(vec![broken, good], OutputFormat::Woff, output_dir.path().to_path_buf());
    let events = collect_events(facade.start_job(job).unwrap()).await;

    assert_eq!(
        events,
        vec![
            WorkerEvent::Status("Converting: broken.otf".into()),
            WorkerEvent::Progress(50),
            WorkerEvent::Status("Converting: good.ttf".into()),
            WorkerEvent::Progress(100),
            WorkerEvent::Finished {
                success: true,
                message: "1 out of 2 files converted successfully".into(),
            },
        ]
    );
    assert_eq!(facade.state(), JobState::Completed);
    assert_eq!(list_dir(output_dir.path()), vec!["good.woff".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn facade_fails_empty_jobs() {
    let output_dir = tempfile::tempdir().unwrap();
    let facade = ConversionFacade::new(Arc::new(dispatcher()), Handle::current());
    let job = ConversionJob::new(Vec::new(), OutputFormat::Ttf, output_dir.path().to_path_buf());
    let events = collect_events(facade.start_job(job).unwrap()).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        WorkerEvent::Finished { success, message } => {
            assert!(!success);
            assert!(message.starts_with("Conversion error: "));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(facade.state(), JobState::Failed);
}

// 每個檔案都等到測試放行才完成
struct GatedDispatcher {
    gate: Mutex<mpsc::Receiver<()>>,
}

impl ConversionServiceTrait for GatedDispatcher {
    fn convert_file(&self, input: &Path, format: OutputFormat, output_dir: &Path) -> ConversionResult {
        let gate = self.gate.lock().unwrap();
        gate.recv().unwrap();
        ConversionResult::succeeded(input, output_dir.join(format!("out.{}", format.extension())))
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn facade_rejects_a_second_job_while_running() {
    let output_dir = tempfile::tempdir().unwrap();
    let (release, gate) = mpsc::channel();
    let facade = ConversionFacade::new(
        Arc::new(GatedDispatcher { gate: Mutex::new(gate) }),
        Handle::current(),
    );
    let job = ConversionJob::new(vec![PathBuf::from("a.ttf")], OutputFormat::Ttf, output_dir.path().to_path_buf());

    let first = facade.start_job(job.clone()).unwrap();
    assert_eq!(facade.state(), JobState::Running);
    assert!(facade.start_job(job.clone()).is_err());

    release.send(()).unwrap();
    let events = collect_events(first).await;
    assert!(matches!(events.last(), Some(WorkerEvent::Finished { success: true, .. })));
    assert_eq!(facade.state(), JobState::Completed);

    release.send(()).unwrap();
    let events = collect_events(facade.start_job(job).unwrap()).await;
    assert_eq!(events.len(), 3);
}
