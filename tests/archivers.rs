//! Directory-backed archivers driven through a librarian.

use std::fs;
use std::path::Path;
use std::thread;

use librarian::{
    Archiver, BlockArchiver, Context, ErrorKind, FileArchiver, Librarian, SharedLibrarian,
    SqliteConnection, Value,
};
use tempfile::tempdir;

fn connection() -> SqliteConnection {
    let mut conn = SqliteConnection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE bug (bugid INTEGER PRIMARY KEY, title TEXT)")
        .unwrap();
    conn
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn file_archiver_runs_templates_with_includes() {
    let dir = tempdir().unwrap();
    write(dir.path(), "add_bug.sql", "INSERT INTO bug (title) VALUES (:title)");
    write(
        dir.path(),
        "report.sql",
        "include add_bug\n\nSELECT1 last_insert_rowid() AS bugid",
    );
    write(dir.path(), "notes.txt", "not a template");

    let mut lib = Librarian::new(FileArchiver::new(dir.path()), connection());

    assert_eq!(
        lib.toc().unwrap().into_iter().collect::<Vec<_>>(),
        ["add_bug", "report"]
    );

    let mut ctx = Context::new().with("title", "crash");
    assert_eq!(lib.execute("report", &mut ctx).unwrap(), 1);
    assert_eq!(ctx.scalar("bugid"), Some(&Value::Int(1)));

    let err = lib.execute("notes", &mut ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
}

#[test]
fn file_archiver_recompiles_changed_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "answer.sql", "SELECT1 1 AS n");

    let mut lib = Librarian::new(FileArchiver::new(dir.path()), connection());
    let mut ctx = Context::new();

    lib.execute("answer", &mut ctx).unwrap();
    assert_eq!(ctx.scalar("n"), Some(&Value::Int(1)));
    assert!(lib.archiver().is_valid("answer"));

    write(dir.path(), "answer.sql", "SELECT1 42 AS n");
    assert!(!lib.archiver().is_valid("answer"));

    lib.execute("answer", &mut ctx).unwrap();
    assert_eq!(ctx.scalar("n"), Some(&Value::Int(42)));
}

#[test]
fn file_archiver_custom_extension() {
    let dir = tempdir().unwrap();
    write(dir.path(), "count.tmpl", "SELECT1 count(*) AS n FROM bug");
    write(dir.path(), "other.sql", "SELECT1 0 AS n");

    let archiver = FileArchiver::new(dir.path()).extension(".tmpl");
    let mut lib = Librarian::new(archiver, connection());

    assert_eq!(lib.prepare_all().unwrap(), 1);
    let mut ctx = Context::new();
    lib.execute("count", &mut ctx).unwrap();
    assert_eq!(ctx.scalar("n"), Some(&Value::Int(0)));
}

#[test]
fn block_archiver_includes_across_files() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "bugs.lib",
        "add_bug:\nINSERT INTO bug (title) VALUES (:title);\n;;\n\n\
         count_bugs:\nSELECT1 count(*) AS n FROM bug\n;;\n",
    );
    write(
        dir.path(),
        "reports.lib",
        "report:\ninclude add_bug\n\ninclude count_bugs\n;;\n",
    );

    let mut lib = Librarian::new(BlockArchiver::new(dir.path()), connection());
    assert_eq!(lib.toc().unwrap().len(), 3);

    let mut ctx = Context::new().with("title", "crash");
    assert_eq!(lib.execute("report", &mut ctx).unwrap(), 1);
    assert_eq!(ctx.scalar("n"), Some(&Value::Int(1)));
    assert_eq!(
        lib.archiver().source_of("report"),
        Some(dir.path().join("reports.lib").as_path())
    );
}

#[test]
fn block_archiver_invalidates_every_tag_of_changed_file() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "lib.lib",
        "one:\nSELECT1 1 AS n\n;;\ntwo:\nSELECT1 2 AS n\n;;\n",
    );

    let mut lib = Librarian::new(BlockArchiver::new(dir.path()), connection());
    lib.prepare(["one", "two"]).unwrap();
    assert!(lib.archiver().is_valid("one"));
    assert!(lib.archiver().is_valid("two"));

    write(
        dir.path(),
        "lib.lib",
        "one:\nSELECT1 10 AS n\n;;\ntwo:\nSELECT1 20 AS n\n;;\n",
    );
    assert!(!lib.archiver().is_valid("one"));
    assert!(!lib.archiver().is_valid("two"));

    let mut ctx = Context::new();
    lib.execute("two", &mut ctx).unwrap();
    assert_eq!(ctx.scalar("n"), Some(&Value::Int(20)));
}

#[test]
fn shared_librarian_over_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "add.sql", "INSERT INTO bug (title) VALUES (:title)");
    write(dir.path(), "count.sql", "SELECT1 count(*) AS n FROM bug");

    let shared = SharedLibrarian::new(Librarian::new(FileArchiver::new(dir.path()), connection()));

    let handles: Vec<_> = (0..3)
        .map(|worker| {
            let lib = shared.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let title = format!("bug {worker}-{i}");
                    let mut ctx = Context::new().with("title", title);
                    lib.execute("add", &mut ctx).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut ctx = Context::new();
    shared.execute("count", &mut ctx).unwrap();
    assert_eq!(ctx.scalar("n"), Some(&Value::Int(30)));
}

#[cfg(feature = "cli")]
#[test]
fn settings_open_block_layout() {
    use librarian::cli::Settings;

    let dir = tempdir().unwrap();
    write(dir.path(), "all.lib", "ping:\nSELECT1 'pong' AS reply\n;;\n");

    let toml = format!(
        "templates = {:?}\nlayout = \"blocks\"\n\n[librarian]\nauto_commit = false\n",
        dir.path().to_str().unwrap()
    );
    let settings = Settings::parse(&toml).unwrap();
    let mut lib = settings.open().unwrap();

    assert!(!lib.auto_commit());
    let mut ctx = Context::new();
    lib.execute("ping", &mut ctx).unwrap();
    assert_eq!(ctx.scalar("reply"), Some(&Value::Text("pong".into())));
}
