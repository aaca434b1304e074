//! Integration tests for the taskbridge-directory crate.
//!
//! These tests exercise pattern building, the user directory, and photo
//! prefetching together through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskbridge_directory::{PhotoLoader, PhotoPrefetcher, QueryPattern, User, UserDirectory};

#[derive(Default)]
struct CountingLoader {
    loads: AtomicUsize,
}

impl PhotoLoader for CountingLoader {
    fn load(&self, _url: &str) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }
}

fn names(users: Vec<User>) -> Vec<String> {
    users.into_iter().map(|u| u.name).collect()
}

// ═══════════════════════════════════════════════════════════════════════
//  Directory + pattern
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn type_ahead_over_a_populated_workspace() {
    let directory = UserDirectory::default();
    directory.upsert_all(
        "ws1",
        vec![
            User::new("1", "Ann Lee"),
            User::new("2", "Annabel Smith"),
            User::new("3", "Joanna Banner"),
            User::new("4", "Dan Annex"),
        ],
    );

    assert_eq!(
        names(directory.filter("ws1", &QueryPattern::build("ann"))),
        vec!["Ann Lee", "Annabel Smith", "Dan Annex"]
    );
    assert_eq!(
        names(directory.filter("ws1", &QueryPattern::build("ann sm"))),
        vec!["Annabel Smith"]
    );
    assert_eq!(directory.filter("ws1", &QueryPattern::build("")).len(), 4);
}

#[test]
fn later_observation_changes_search_results() {
    let directory = UserDirectory::default();
    directory.upsert("ws1", User::new("7", "Pat"));
    assert!(directory.filter("ws1", &QueryPattern::build("rob")).is_empty());

    directory.upsert("ws1", User::new("7", "Robin Pat"));
    assert_eq!(
        names(directory.filter("ws1", &QueryPattern::build("rob"))),
        vec!["Robin Pat"]
    );
    assert_eq!(directory.user_count("ws1"), 1);
}

// ═══════════════════════════════════════════════════════════════════════
//  Photo prefetch through the directory
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn shared_photo_across_workspaces_loads_once() {
    let loader = Arc::new(CountingLoader::default());
    let directory = UserDirectory::new(Arc::new(PhotoPrefetcher::new(loader.clone())));

    let ann = User::new("1", "Ann").with_photo("https://img/ann.png");
    directory.upsert("ws1", ann.clone());
    directory.upsert("ws2", ann);
    directory.upsert("ws1", User::new("2", "Bob").with_photo("https://img/bob.png"));

    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    assert_eq!(directory.photos().len(), 2);
}

#[test]
fn concurrent_upserts_into_one_workspace() {
    let directory = Arc::new(UserDirectory::default());

    let threads: Vec<_> = (0..4)
        .map(|t| {
            let d = Arc::clone(&directory);
            std::thread::spawn(move || {
                for i in 0..50 {
                    d.upsert("ws1", User::new(format!("{t}-{i}"), format!("User {i}")));
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(directory.user_count("ws1"), 200);
}
