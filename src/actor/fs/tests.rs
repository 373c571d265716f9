use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::debouncer::{DEBOUNCE_MS, Debouncer, REBUILD_COOLDOWN_MS, change_kind};
use super::scope::{WatchScope, is_temp_file};
use super::types::{ChangeKind, WatchRoot};
use super::watch_roots::WatchRoots;
use crate::actor::messages::BuildMsg;
use crate::config::{CopyPattern, ProjectConfig, test_config_at};
use crate::utils::path::normalize_path;

fn make_config() -> (TempDir, ProjectConfig) {
    let temp = TempDir::new().unwrap();
    let config = test_config_at(temp.path());
    std::fs::create_dir_all(&config.build.entry).unwrap();
    std::fs::create_dir_all(&config.build.output).unwrap();
    (temp, config)
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

/// Pretend the last event happened long enough ago.
fn age(debouncer: &mut Debouncer) {
    debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 50));
}

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
    assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
}

#[test]
fn test_repeated_events_coalesce() {
    let mut debouncer = Debouncer::new();
    for _ in 0..5 {
        debouncer.add(PathBuf::from("/p/src/js/app.js"), ChangeKind::Modified);
    }
    debouncer.add(PathBuf::from("/p/src/js/admin.js"), ChangeKind::Created);
    debouncer.add(PathBuf::from("/p/src/js/admin.js"), ChangeKind::Modified);
    age(&mut debouncer);

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(
        changes,
        vec![
            (PathBuf::from("/p/src/js/admin.js"), ChangeKind::Created),
            (PathBuf::from("/p/src/js/app.js"), ChangeKind::Modified),
        ]
    );
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_not_ready_within_debounce() {
    let mut debouncer = Debouncer::new();
    debouncer.add(PathBuf::from("/p/a.js"), ChangeKind::Modified);

    assert!(!debouncer.is_ready());
    assert!(debouncer.sleep_duration() <= Duration::from_millis(DEBOUNCE_MS));
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_cooldown_after_rebuild() {
    let mut debouncer = Debouncer::new();
    debouncer.last_rebuild = Some(Instant::now());
    debouncer.add(PathBuf::from("/p/a.js"), ChangeKind::Modified);
    age(&mut debouncer);
    assert!(!debouncer.is_ready());

    debouncer.last_rebuild =
        Some(Instant::now() - Duration::from_millis(REBUILD_COOLDOWN_MS + 50));
    assert!(debouncer.is_ready());
}

#[test]
fn test_state_transitions() {
    let mut debouncer = Debouncer::new();
    let path = PathBuf::from("/p/a.js");

    debouncer.add(path.clone(), ChangeKind::Removed);
    debouncer.add(path.clone(), ChangeKind::Created);
    assert_eq!(debouncer.changes[&path], ChangeKind::Created);

    let other = PathBuf::from("/p/b.js");
    debouncer.add(other.clone(), ChangeKind::Modified);
    debouncer.add(other.clone(), ChangeKind::Removed);
    assert_eq!(debouncer.changes[&other], ChangeKind::Removed);
}

#[test]
fn test_created_then_removed_is_dropped() {
    let mut debouncer = Debouncer::new();
    debouncer.add(PathBuf::from("/p/scratch.js"), ChangeKind::Created);
    debouncer.add(PathBuf::from("/p/scratch.js"), ChangeKind::Removed);
    age(&mut debouncer);

    assert!(debouncer.take_if_ready().is_none());
    assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
}

#[test]
fn test_change_kind_mapping() {
    use notify::event::{MetadataKind, ModifyKind};

    assert_eq!(change_kind(&create_kind()), Some(ChangeKind::Created));
    assert_eq!(change_kind(&modify_kind()), Some(ChangeKind::Modified));
    assert_eq!(change_kind(&remove_kind()), Some(ChangeKind::Removed));
    assert_eq!(
        change_kind(&notify::EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime
        ))),
        None
    );
    assert_eq!(
        change_kind(&notify::EventKind::Access(
            notify::event::AccessKind::Any
        )),
        None
    );
}

#[test]
fn test_temp_files() {
    assert!(is_temp_file(Path::new("/p/src/js/.app.js.swp")));
    assert!(is_temp_file(Path::new("/p/src/js/app.js~")));
    assert!(is_temp_file(Path::new("/p/src/js/app.js.bak")));
    assert!(is_temp_file(Path::new("/p/src/js/4913")));
    assert!(!is_temp_file(Path::new("/p/src/js/app.js")));
}

#[test]
fn test_scope_ignores_output() {
    let (_temp, config) = make_config();
    let scope = WatchScope::from_config(&config);

    assert!(scope.accepts(&config.build.entry.join("app.js")));
    assert!(!scope.accepts(&config.build.output.join("js/app.bundle.js")));
    assert!(!scope.accepts(&config.build.entry.join("app.js~")));
}

#[test]
fn test_scope_roots() {
    let (_temp, mut config) = make_config();
    let root = config.get_root().to_path_buf();
    config.build.deps = vec![root.join("lib")];
    config.build.copy = vec![
        CopyPattern::new(root.join("static"), "."),
        // Nested inside the entry dir, already covered
        CopyPattern::new(config.build.entry.join("vendor"), "vendor"),
    ];
    let scope = WatchScope::from_config(&config);
    let roots = scope.roots();

    assert!(roots.contains(&WatchRoot::recursive(config.build.entry.clone())));
    assert!(roots.contains(&WatchRoot::recursive(root.join("lib"))));
    assert!(roots.contains(&WatchRoot::recursive(root.join("static"))));
    assert!(!roots.iter().any(|r| r.path == config.build.entry.join("vendor")));

    // Single files are watched through their directory
    assert!(roots.contains(&WatchRoot::flat(root.clone())));
    assert!(roots.contains(&WatchRoot::flat(root.join("src"))));
    assert!(!roots.iter().any(|r| r.path == config.config_path));
    assert!(!roots.iter().any(|r| r.path == config.build.html.template));
}

#[test]
fn test_single_files_filtered_by_path() {
    let (_temp, config) = make_config();
    let root = config.get_root().to_path_buf();
    let scope = WatchScope::from_config(&config);

    assert!(scope.accepts(&config.config_path));
    assert!(scope.accepts(&config.build.html.template));
    assert!(!scope.accepts(&root.join("README.md")));
    assert!(!scope.accepts(&root.join("src/notes.txt")));
}

#[test]
fn test_rename_save_keeps_file_watched() {
    let (_temp, config) = make_config();
    std::fs::write(&config.config_path, "[serve]\nport = 3000\n").unwrap();
    let scope = WatchScope::from_config(&config);

    let mut watcher =
        notify::recommended_watcher(|_: notify::Result<notify::Event>| {}).unwrap();
    let mut roots = WatchRoots::new(scope.roots());
    roots.attach_existing(&mut watcher);

    // Editors save by writing a new file and renaming it over the old one
    let swap = config.get_root().join("sprig.toml.new");
    std::fs::write(&swap, "[serve]\nport = 4000\n").unwrap();
    std::fs::rename(&swap, &config.config_path).unwrap();
    roots.maintain(&mut watcher);

    assert!(roots.is_attached(config.get_root()));
    assert!(scope.accepts(&config.config_path));
}

#[test]
fn test_imported_styles_outside_entry_dir_watched() {
    let (temp, config) = make_config();
    let scss = temp.path().join("src/scss/styles.scss");
    std::fs::create_dir_all(scss.parent().unwrap()).unwrap();
    std::fs::write(&scss, ".a { color: red; }\n").unwrap();
    std::fs::write(
        config.build.entry.join("main.js"),
        "import '../scss/styles.scss';\n",
    )
    .unwrap();

    let plan = crate::pipeline::plan_build(&config).unwrap();
    let scss = normalize_path(&scss);
    assert!(plan.inputs().iter().any(|p| normalize_path(p) == scss));

    let mut scope = WatchScope::from_config(&config);
    assert!(!scope.accepts(&scss));

    let added = scope.add_inputs(plan.inputs());
    let styles_dir = scss.parent().unwrap().to_path_buf();
    assert_eq!(added, vec![WatchRoot::flat(styles_dir.clone())]);
    assert!(scope.accepts(&scss));
    // A partial created next to it counts too
    assert!(scope.accepts(&styles_dir.join("_new.scss")));

    // Inputs already covered add nothing
    assert!(scope.add_inputs(plan.inputs()).is_empty());
}

#[test]
fn test_rebuild_msg_flags_config() {
    let (_temp, config) = make_config();
    let scope = WatchScope::from_config(&config);
    let app = config.build.entry.join("app.js");

    assert_eq!(
        scope.rebuild_msg(vec![app.clone()]),
        BuildMsg::Rebuild {
            changed: vec![app.clone()],
            config_changed: false,
        }
    );
    assert_eq!(
        scope.rebuild_msg(vec![app.clone(), config.config_path.clone()]),
        BuildMsg::Rebuild {
            changed: vec![app, config.config_path.clone()],
            config_changed: true,
        }
    );
}
