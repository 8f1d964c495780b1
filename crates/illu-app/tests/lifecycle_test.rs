//! Save and delete against the real raster pipeline and filesystem store.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use illu_app::{AttributeInput, AttributeOutcome, DeleteIllustrations, SaveIllustrations};
use illu_core::ports::{DerivativeStorePort, IllustrationRecordPort};
use illu_core::{
    AttributeConfig, CropInstruction, DerivedArtifactSet, IllustrationConfig, IllustrationError,
    RecordId, StoreLayout, Upload,
};
use illu_infra::{CodecRegistry, FsDerivativeStore, InMemoryRecordStore, RasterPipeline};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    config: Arc<IllustrationConfig>,
    records: Arc<InMemoryRecordStore>,
    store: Arc<FsDerivativeStore>,
    save: SaveIllustrations,
    delete: DeleteIllustrations,
}

impl Harness {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();

        let dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(dir.path(), "/", "product");
        let config = Arc::new(
            IllustrationConfig::new(layout.clone())
                .with_attribute("cover", AttributeConfig::with_crop_width(240).crop_steps(3)),
        );
        let records = Arc::new(InMemoryRecordStore::new());
        let store = Arc::new(FsDerivativeStore::new(layout));
        let pipeline = Arc::new(RasterPipeline::new(Arc::new(CodecRegistry::default()), 2000));

        let save = SaveIllustrations::from_ports(
            config.clone(),
            records.clone(),
            store.clone(),
            pipeline,
        );
        let delete =
            DeleteIllustrations::from_ports(config.clone(), records.clone(), store.clone());

        Self {
            dir,
            config,
            records,
            store,
            save,
            delete,
        }
    }

    fn save_png(
        &self,
        record: &RecordId,
        width: u32,
        height: u32,
        crop: CropInstruction,
    ) -> AttributeOutcome {
        let pixel = Rgba([9, 9, 9, 255]);
        let raster = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel));
        let mut bytes = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let upload = Upload::new(bytes, "image/png", "photo.png");

        let mut submission = BTreeMap::new();
        submission.insert("cover".to_string(), AttributeInput::upload(upload, crop));
        self.save
            .execute(record, &submission)
            .into_outcomes()
            .remove("cover")
            .unwrap()
    }

    fn set_of(&self, file_name: &str) -> DerivedArtifactSet {
        let cfg = self.config.attribute("cover").unwrap();
        DerivedArtifactSet::new("cover", file_name, cfg)
    }

    fn all_exist(&self, file_name: &str) -> bool {
        self.set_of(file_name).keys().iter().all(|k| self.store.exists(k))
    }

    fn none_exist(&self, file_name: &str) -> bool {
        self.set_of(file_name).keys().iter().all(|k| !self.store.exists(k))
    }

    fn paths_of(&self, file_name: &str) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self
            .set_of(file_name)
            .keys()
            .iter()
            .map(|k| self.store.path_of(k))
            .collect();
        paths.sort();
        paths
    }

    /// Every file below the store root, sorted.
    fn files_on_disk(&self) -> Vec<PathBuf> {
        fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(path);
                }
            }
        }
        let mut files = Vec::new();
        walk(self.dir.path(), &mut files);
        files.sort();
        files
    }
}

fn committed(outcome: AttributeOutcome) -> (String, Option<String>) {
    match outcome {
        AttributeOutcome::Committed { file_name, replaced } => (file_name, replaced),
        other => panic!("expected commit, got {:?}", other),
    }
}

#[test]
fn second_save_replaces_first_set() {
    let h = Harness::new();
    let record = RecordId::from("1");
    let crop = CropInstruction::new(0, 0, 480, 360, 4.0 / 3.0);

    let (first, _) = committed(h.save_png(&record, 480, 360, crop));
    assert!(h.all_exist(&first));

    let (second, replaced) = committed(h.save_png(&record, 480, 360, crop));
    assert_eq!(replaced.as_deref(), Some(first.as_str()));
    assert_ne!(first, second);
    assert!(h.all_exist(&second));
    assert!(h.none_exist(&first));
    assert_eq!(
        h.records.current_file_name(&record, "cover").unwrap(),
        Some(second)
    );
}

#[test]
fn too_small_upload_changes_nothing() {
    let h = Harness::new();
    let record = RecordId::from("1");
    let crop = CropInstruction::new(0, 0, 480, 360, 4.0 / 3.0);
    let (kept, _) = committed(h.save_png(&record, 480, 360, crop));

    let outcome = h.save_png(&record, 200, 150, CropInstruction::new(0, 0, 200, 150, 4.0 / 3.0));

    match outcome {
        AttributeOutcome::Rejected(IllustrationError::TooSmall { width, height, .. }) => {
            assert_eq!((width, height), (200, 150));
        }
        other => panic!("expected too-small rejection, got {:?}", other),
    }
    assert_eq!(
        h.records.current_file_name(&record, "cover").unwrap(),
        Some(kept.clone())
    );
    assert!(h.all_exist(&kept));
    assert_eq!(h.files_on_disk(), h.paths_of(&kept));
    assert_eq!(h.records.len().unwrap(), 1);
}

#[test]
fn out_of_range_aspect_writes_nothing() {
    let h = Harness::new();
    let record = RecordId::from("1");
    let crop = CropInstruction::new(0, 0, 480, 360, 4.0 / 3.0);
    let (kept, _) = committed(h.save_png(&record, 480, 360, crop));

    let outcome = h.save_png(&record, 480, 360, CropInstruction::new(0, 0, 480, 360, 0.01));

    assert!(matches!(
        outcome,
        AttributeOutcome::Rejected(IllustrationError::InvalidCrop(_))
    ));
    assert_eq!(h.files_on_disk(), h.paths_of(&kept));
}

#[test]
fn record_deletion_is_idempotent() {
    let h = Harness::new();
    let record = RecordId::from("1");
    let (name, _) = committed(h.save_png(&record, 480, 360, CropInstruction::default()));

    assert_eq!(h.delete.execute(&record).unwrap(), 3);
    assert!(h.none_exist(&name));
    assert_eq!(h.records.current_file_name(&record, "cover").unwrap(), None);

    assert_eq!(h.delete.execute(&record).unwrap(), 0);
}

#[test]
fn different_records_never_share_files() {
    let h = Harness::new();
    let crop = CropInstruction::new(0, 0, 480, 360, 4.0 / 3.0);

    let (a, _) = committed(h.save_png(&RecordId::from("1"), 480, 360, crop));
    let (b, _) = committed(h.save_png(&RecordId::from("2"), 480, 360, crop));
    assert_ne!(a, b);

    h.delete.execute(&RecordId::from("1")).unwrap();
    assert!(h.none_exist(&a));
    assert!(h.all_exist(&b));
}
