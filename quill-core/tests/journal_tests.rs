//! Integration tests for the journal service
//!
//! Every test runs against a real DuckDB file in a temporary directory.
//!
//! Run with: cargo test --test journal_tests -- --nocapture

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use quill_core::adapters::duckdb::DuckDbRepository;
use quill_core::adapters::user::StaticUser;
use quill_core::domain::DEFAULT_PAGE_SIZE;
use quill_core::services::{JournalService, StatusService};
use quill_core::Error;

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test repository with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn journal_for(repo: &Arc<DuckDbRepository>, user: &str) -> JournalService {
    JournalService::new(Arc::clone(repo), Arc::new(StaticUser::new(user)))
}

fn anonymous_journal(repo: &Arc<DuckDbRepository>) -> JournalService {
    JournalService::new(Arc::clone(repo), Arc::new(StaticUser::anonymous()))
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create `count` entries dated one day apart starting at 2024-01-01
async fn seed(journal: &JournalService, count: u32) {
    for i in 0..count {
        journal
            .create(&format!("Entry {}", i), day(2024, 1, 1 + i), "body")
            .await
            .unwrap();
    }
}

// ============================================================================
// Create / Get
// ============================================================================

#[tokio::test]
async fn test_create_then_get_returns_trimmed_title_and_day() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let late_evening = day(2024, 6, 30).and_hms_opt(23, 45, 0).unwrap();
    let created = journal
        .create("   Summer solstice  ", late_evening, "  long day \n")
        .await
        .unwrap();

    let fetched = journal.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Summer solstice");
    assert_eq!(fetched.date, day(2024, 6, 30));
    assert_eq!(fetched.body, "long day");
    assert_eq!(fetched.owner_id, "alice");
    assert_eq!(fetched.created_at, fetched.updated_at);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_accepts_zoned_datetime() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let instant = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
    let created = journal.create("Zoned", instant, "").await.unwrap();
    assert_eq!(created.date, day(2024, 3, 10));
}

#[tokio::test]
async fn test_create_without_user_is_unauthenticated() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = anonymous_journal(&repo);

    let err = journal.create("Title", day(2024, 1, 1), "body").await.unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
}

#[tokio::test]
async fn test_create_validates_title() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let blank = journal.create("   ", day(2024, 1, 1), "body").await;
    assert!(matches!(blank, Err(Error::Validation(_))));

    let long = journal.create(&"x".repeat(201), day(2024, 1, 1), "body").await;
    assert!(matches!(long, Err(Error::Validation(_))));

    let page = journal.list_page(1, 10, true, None, None).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_create_and_update_reject_unstorable_years() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let too_late = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
    let too_early = NaiveDate::from_ymd_opt(-1, 6, 1).unwrap();

    for date in [too_late, too_early] {
        let result = journal.create("Far off", date, "").await;
        assert!(matches!(result, Err(Error::Validation(_))), "accepted {}", date);
    }

    let created = journal.create("Today", day(2024, 1, 1), "").await.unwrap();
    let result = journal.update(created.id, "Today", too_late, "").await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let unchanged = journal.get(created.id).await.unwrap().unwrap();
    assert_eq!(unchanged.date, day(2024, 1, 1));
    assert_eq!(journal.list(None, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    assert!(journal.get(12345).await.unwrap().is_none());
}

// ============================================================================
// Update / Delete
// ============================================================================

#[tokio::test]
async fn test_update_overwrites_and_refreshes_updated_at() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let created = journal.create("Draft", day(2024, 1, 1), "v1").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    journal
        .update(created.id, "  Final ", day(2024, 1, 2), " v2 ")
        .await
        .unwrap();

    let updated = journal.get(created.id).await.unwrap().unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.body, "v2");
    assert_eq!(updated.date, day(2024, 1, 2));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_update_and_delete_of_missing_id_are_silent() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    journal.update(999, "Nope", day(2024, 1, 1), "").await.unwrap();
    journal.delete(999).await.unwrap();
}

#[tokio::test]
async fn test_update_rejects_blank_title() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let created = journal.create("Keep me", day(2024, 1, 1), "").await.unwrap();
    let result = journal.update(created.id, "  ", day(2024, 1, 1), "").await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let unchanged = journal.get(created.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "Keep me");
}

#[tokio::test]
async fn test_delete_removes_entry() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let created = journal.create("Gone soon", day(2024, 1, 1), "").await.unwrap();
    journal.delete(created.id).await.unwrap();
    assert!(journal.get(created.id).await.unwrap().is_none());
}

// ============================================================================
// Ownership Isolation
// ============================================================================

#[tokio::test]
async fn test_users_never_see_each_others_entries() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = journal_for(&repo, "alice");
    let bob = journal_for(&repo, "bob");

    let secret = alice
        .create("Alice foo", day(2024, 1, 1), "foo for alice")
        .await
        .unwrap();
    bob.create("Bob foo", day(2024, 1, 1), "foo for bob").await.unwrap();

    // Reads
    assert!(bob.get(secret.id).await.unwrap().is_none());
    let bob_entries = bob.list(None, None).await.unwrap();
    assert_eq!(bob_entries.len(), 1);
    assert!(bob_entries.iter().all(|e| e.owner_id == "bob"));

    for (from, to) in [
        (None, None),
        (Some(day(2024, 1, 1)), Some(day(2024, 1, 1))),
        (Some(day(2000, 1, 1)), None),
    ] {
        let found = bob.search(Some("foo"), from, to, 1, 100).await.unwrap();
        assert!(found.items.iter().all(|e| e.owner_id == "bob"));
        assert_eq!(found.total, 1);

        let page = bob.list_page(1, 100, false, from, to).await.unwrap();
        assert!(page.items.iter().all(|e| e.owner_id == "bob"));
    }
    assert_eq!(bob.counts_by_day(2024, 1).await.unwrap()[&day(2024, 1, 1)], 1);

    // Writes
    bob.update(secret.id, "Hijacked", day(2024, 1, 1), "").await.unwrap();
    bob.delete(secret.id).await.unwrap();

    let still_there = alice.get(secret.id).await.unwrap().unwrap();
    assert_eq!(still_there.title, "Alice foo");
}

#[tokio::test]
async fn test_anonymous_reads_are_empty() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = journal_for(&repo, "alice");
    let nobody = anonymous_journal(&repo);

    let created = alice.create("Mine", day(2024, 1, 1), "").await.unwrap();

    assert!(nobody.list(None, None).await.unwrap().is_empty());
    assert!(nobody.get(created.id).await.unwrap().is_none());
    assert_eq!(nobody.list_page(1, 10, true, None, None).await.unwrap().total, 0);
    assert_eq!(nobody.search(None, None, None, 1, 10).await.unwrap().total, 0);
    assert!(nobody.counts_by_day(2024, 1).await.unwrap().is_empty());

    nobody.update(created.id, "x", day(2024, 1, 1), "").await.unwrap();
    nobody.delete(created.id).await.unwrap();
    assert!(alice.get(created.id).await.unwrap().is_some());
}

// ============================================================================
// Listing and Pagination
// ============================================================================

#[tokio::test]
async fn test_list_orders_by_date_then_update_time() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let older_day = journal.create("Older day", day(2024, 1, 1), "").await.unwrap();
    let first = journal.create("Same day 1", day(2024, 1, 2), "").await.unwrap();
    let second = journal.create("Same day 2", day(2024, 1, 2), "").await.unwrap();

    // Touching the first same-day entry moves it ahead of the second
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    journal
        .update(first.id, "Same day 1", day(2024, 1, 2), "edited")
        .await
        .unwrap();

    let ids: Vec<i64> = journal
        .list(None, None)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id, older_day.id]);
}

#[tokio::test]
async fn test_list_date_range_is_inclusive() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");
    seed(&journal, 5).await;

    let entries = journal
        .list(Some(day(2024, 1, 2)), Some(day(2024, 1, 4)))
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = entries.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![day(2024, 1, 4), day(2024, 1, 3), day(2024, 1, 2)]);
}

#[tokio::test]
async fn test_list_page_offsets_and_totals() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");
    seed(&journal, 5).await;

    let page2 = journal.list_page(2, 2, true, None, None).await.unwrap();
    assert_eq!(page2.total, 5);
    let dates: Vec<NaiveDate> = page2.items.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![day(2024, 1, 3), day(2024, 1, 2)]);

    let oldest = journal.list_page(1, 2, false, None, None).await.unwrap();
    assert_eq!(oldest.items[0].date, day(2024, 1, 1));

    let past_end = journal.list_page(10, 2, true, None, None).await.unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 5);
}

#[tokio::test]
async fn test_list_page_clamps_non_positive_arguments() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");
    seed(&journal, 25).await;

    let first = journal.list_page(1, 20, true, None, None).await.unwrap();
    for page in [0, -1, -100] {
        let clamped = journal.list_page(page, 20, true, None, None).await.unwrap();
        assert_eq!(clamped.items, first.items);
    }

    for size in [0, -5] {
        let clamped = journal.list_page(1, size, true, None, None).await.unwrap();
        assert_eq!(clamped.items.len() as i64, DEFAULT_PAGE_SIZE);
        assert_eq!(clamped.items, first.items);
        assert_eq!(clamped.total, 25);
    }
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_matches_title_or_body_case_insensitively() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    let in_body = journal
        .create("Tuesday", day(2024, 1, 1), "this has foo in it")
        .await
        .unwrap();
    let in_title = journal.create("FOOd diary", day(2024, 1, 2), "").await.unwrap();
    journal.create("Unrelated", day(2024, 1, 3), "nothing here").await.unwrap();

    let found = journal.search(Some("  foo "), None, None, 1, 10).await.unwrap();
    assert_eq!(found.total, 2);
    let ids: Vec<i64> = found.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![in_title.id, in_body.id]);
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    // Word-final sigma lowercases differently depending on context
    let greek = journal.create("ΟΔΟΣ", day(2024, 1, 1), "").await.unwrap();
    let german = journal
        .create("Straße", day(2024, 1, 2), "ÜBER DEN FLUSS")
        .await
        .unwrap();

    for query in ["ΟΔΟΣ", "οδοσ", "ΟΔΟ"] {
        let found = journal.search(Some(query), None, None, 1, 10).await.unwrap();
        let ids: Vec<i64> = found.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![greek.id], "searching {}", query);
    }

    for query in ["STRAßE", "über den", "Straße"] {
        let found = journal.search(Some(query), None, None, 1, 10).await.unwrap();
        let ids: Vec<i64> = found.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![german.id], "searching {}", query);
    }
}

#[tokio::test]
async fn test_search_with_blank_query_filters_only_by_date() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");
    seed(&journal, 5).await;

    let all = journal.search(Some("   "), None, None, 1, 10).await.unwrap();
    assert_eq!(all.total, 5);

    let ranged = journal
        .search(None, Some(day(2024, 1, 4)), None, 0, 0)
        .await
        .unwrap();
    assert_eq!(ranged.total, 2);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    journal.create("100% done", day(2024, 1, 1), "").await.unwrap();
    journal.create("Half done", day(2024, 1, 2), "").await.unwrap();

    let found = journal.search(Some("%"), None, None, 1, 10).await.unwrap();
    assert_eq!(found.total, 1);
    let found = journal.search(Some("_"), None, None, 1, 10).await.unwrap();
    assert_eq!(found.total, 0);
}

// ============================================================================
// Calendar Counts
// ============================================================================

#[tokio::test]
async fn test_counts_by_day_groups_within_month() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    journal.create("A", day(2024, 1, 1), "").await.unwrap();
    journal.create("B", day(2024, 1, 1), "").await.unwrap();
    journal.create("Last day", day(2024, 1, 31), "").await.unwrap();
    journal.create("Outside", day(2024, 2, 1), "").await.unwrap();
    journal.create("Outside too", day(2023, 12, 31), "").await.unwrap();

    let counts = journal.counts_by_day(2024, 1).await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[&day(2024, 1, 1)], 2);
    assert_eq!(counts[&day(2024, 1, 31)], 1);
}

#[tokio::test]
async fn test_counts_by_day_two_entries_same_day() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    journal.create("A", day(2024, 1, 1), "").await.unwrap();
    journal.create("B", day(2024, 1, 1), "").await.unwrap();

    let counts = journal.counts_by_day(2024, 1).await.unwrap();
    assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(day(2024, 1, 1), 2)]);
}

#[tokio::test]
async fn test_counts_by_day_rejects_invalid_month() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");

    assert!(matches!(
        journal.counts_by_day(2024, 13).await,
        Err(Error::Validation(_))
    ));
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn test_status_summary() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let journal = journal_for(&repo, "alice");
    let status = StatusService::new(Arc::clone(&repo), Arc::new(StaticUser::new("alice")));

    journal.create("Old", day(2023, 5, 1), "").await.unwrap();
    journal.create("Now 1", day(2024, 2, 3), "").await.unwrap();
    journal.create("Now 2", day(2024, 2, 29), "").await.unwrap();
    journal_for(&repo, "bob")
        .create("Not counted", day(2024, 2, 10), "")
        .await
        .unwrap();

    let summary = status.get_status_at(day(2024, 2, 15)).await.unwrap();
    assert_eq!(summary.user.as_deref(), Some("alice"));
    assert_eq!(summary.total_entries, 3);
    assert_eq!(summary.this_month, 2);
    assert_eq!(summary.date_range.earliest.as_deref(), Some("2023-05-01"));
    assert_eq!(summary.date_range.latest.as_deref(), Some("2024-02-29"));
}

#[tokio::test]
async fn test_status_without_user_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let status = StatusService::new(Arc::clone(&repo), Arc::new(StaticUser::anonymous()));

    let summary = status.get_status().await.unwrap();
    assert!(summary.user.is_none());
    assert_eq!(summary.total_entries, 0);
}
