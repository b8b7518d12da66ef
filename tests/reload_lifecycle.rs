//! End-to-end tests of the ingestion/aggregation/cache pipeline:
//! reloads driven by source file edits and deletions, lookup behavior
//! across the reload lifecycle, and watcher-driven change detection.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use citytemp::services::{FileWatcherConfig, FileWatcherService, ServiceManager};
use citytemp::{
    ChangeCheck, CsvLoader, LookupError, TemperatureService, TemperatureStore, YearlyAverage,
};

fn write_source(path: &PathBuf, contents: &str) {
    let mut file = File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.sync_all().unwrap();
}

fn bump_mtime(path: &PathBuf) {
    let newer = SystemTime::now() + Duration::from_secs(2);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(newer)
        .unwrap();
}

struct Pipeline {
    _dir: TempDir,
    path: PathBuf,
    store: Arc<TemperatureStore>,
    loader: Arc<CsvLoader>,
    service: TemperatureService,
}

fn pipeline(contents: &str) -> Pipeline {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("temperatures.csv");
    write_source(&path, contents);

    let store = Arc::new(TemperatureStore::new());
    let loader = Arc::new(CsvLoader::new(store.clone(), path.clone()));
    let service = TemperatureService::new(store.clone());

    Pipeline {
        _dir: dir,
        path,
        store,
        loader,
        service,
    }
}

#[test]
fn reload_then_lookup() {
    let p = pipeline(
        "Gdansk;2019-01-01;10.0\n\
         Gdansk;2019-06-01;20.0\n\
         Warsaw;2019-01-01;5.0\n",
    );
    p.loader.reload();

    let gdansk = p.service.annual_averages("Gdansk").unwrap();
    assert_eq!(gdansk.city, "Gdansk");
    assert_eq!(gdansk.data, vec![YearlyAverage::new("2019", 15.0)]);

    let warsaw = p.service.annual_averages("Warsaw").unwrap();
    assert_eq!(warsaw.data, vec![YearlyAverage::new("2019", 5.0)]);

    assert_eq!(
        p.service.annual_averages("Londyn").unwrap_err(),
        LookupError::CityNotFound("Londyn".to_string())
    );
    assert_eq!(
        p.service.annual_averages("  ").unwrap_err(),
        LookupError::InvalidCity
    );
}

#[test]
fn lookup_order_preserves_file_order() {
    let p = pipeline(
        "Gdansk;2020-02-01;1.0\n\
         Gdansk;2018-07-01;2.0\n\
         Gdansk;2019-12-01;3.0\n",
    );
    p.loader.reload();

    let years: Vec<String> = p
        .service
        .annual_averages("Gdansk")
        .unwrap()
        .data
        .into_iter()
        .map(|avg| avg.year)
        .collect();
    assert_eq!(years, vec!["2020", "2018", "2019"]);
}

#[test]
fn edit_is_picked_up_by_change_check() {
    let p = pipeline("Gdansk;2019-01-01;10.0\n");
    p.loader.reload();
    assert_eq!(p.loader.check_changed(), ChangeCheck::Unchanged);

    write_source(
        &p.path,
        "Gdansk;2019-01-01;10.0\n\
         Szczecin;2018-05-01;19.5\n",
    );
    bump_mtime(&p.path);

    assert_eq!(p.loader.check_changed(), ChangeCheck::ReloadTriggered);
    assert_eq!(
        p.service.annual_averages("Szczecin").unwrap().data,
        vec![YearlyAverage::new("2018", 19.5)]
    );
}

#[test]
fn deletion_keeps_last_known_good_data() {
    let p = pipeline("Gdansk;2019-01-01;10.0\n");
    p.loader.reload();

    std::fs::remove_file(&p.path).unwrap();
    assert_eq!(p.loader.check_changed(), ChangeCheck::FileRemoved);

    // Previously cached cities still resolve.
    assert!(p.service.annual_averages("Gdansk").is_ok());
    assert_eq!(p.loader.check_changed(), ChangeCheck::Unchanged);

    // A recreated file counts as new again.
    write_source(&p.path, "Gdansk;2019-01-01;30.0\n");
    assert_eq!(p.loader.check_changed(), ChangeCheck::ReloadTriggered);
    assert_eq!(
        p.service.annual_averages("Gdansk").unwrap().data,
        vec![YearlyAverage::new("2019", 30.0)]
    );
}

#[test]
fn store_keys_track_each_load_exactly() {
    let p = pipeline(
        "Gdansk;2019-01-01;10.0\n\
         Warsaw;2019-01-01;5.0\n",
    );
    p.loader.reload();

    let mut keys = p.store.keys();
    keys.sort();
    assert_eq!(keys, vec!["Gdansk", "Warsaw"]);

    // A reload against a shrunken file drops vanished cities.
    write_source(&p.path, "Warsaw;2019-01-01;5.0\n");
    bump_mtime(&p.path);
    p.loader.check_changed();

    assert_eq!(p.store.keys(), vec!["Warsaw".to_string()]);
}

#[test]
fn readers_are_never_blocked_during_reload() {
    let mut contents = String::new();
    for i in 0..5_000 {
        contents.push_str(&format!("City{};2019-01-01;{}.0\n", i % 50, i % 30));
    }
    let p = pipeline(&contents);
    p.loader.reload();

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = p.service.clone();
        let stop = stop.clone();
        handles.push(std::thread::spawn(move || {
            while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                // InvalidCity is impossible here; absence is fine
                // mid-reload, a torn list never is.
                if let Ok(result) = service.annual_averages("City7") {
                    assert!(!result.data.is_empty());
                }
            }
        }));
    }

    for _ in 0..20 {
        p.loader.reload();
    }

    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    for handle in handles {
        handle.join().unwrap();
    }
}

#[tokio::test]
async fn watcher_service_syncs_cache_with_file() {
    let p = pipeline("Gdansk;2019-01-01;10.0\n");

    let manager = Arc::new(ServiceManager::with_defaults());
    let watcher = Arc::new(FileWatcherService::new(
        FileWatcherConfig {
            poll_interval: Duration::from_millis(20),
            enabled: true,
        },
        p.loader.clone(),
    ));
    manager.register(watcher.clone()).unwrap();
    manager.start_all().unwrap();

    // Initial pick-up: recorded mtime starts at 0.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(p.service.annual_averages("Gdansk").is_ok());

    // Edit the file; the watcher reloads within a few polls.
    write_source(&p.path, "Krakow;2021-03-01;7.0\n");
    bump_mtime(&p.path);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(p.service.annual_averages("Krakow").is_ok());
    assert_eq!(
        p.service.annual_averages("Gdansk").unwrap_err(),
        LookupError::CityNotFound("Gdansk".to_string())
    );
    assert!(watcher.stats().reloads_triggered >= 2);

    manager.shutdown().await;
    assert!(!manager.is_healthy());
}
