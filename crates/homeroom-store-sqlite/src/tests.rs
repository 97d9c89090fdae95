//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use homeroom_core::{
  homework::{HomeworkInput, HomeworkPatch, NewHomework},
  store::{DocumentStore, HomeworkFilter},
  subject::{Color, NewSubject},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn subject(name: &str) -> NewSubject {
  NewSubject::new(name, "#FF0000".parse::<Color>().unwrap())
}

fn draft(subject_id: Uuid, day: u32) -> NewHomework {
  NewHomework {
    input:      HomeworkInput::new(
      subject_id,
      NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
      "p.5",
    ),
    created_at: Utc::now(),
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_subject() {
  let s = store().await;

  let subject = s.insert_subject(subject("Math")).await.unwrap();
  assert_eq!(subject.color.as_str(), "#ff0000");

  let fetched = s.get_subject(subject.id).await.unwrap();
  assert_eq!(fetched, Some(subject));
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn subjects_list_by_name() {
  let s = store().await;
  for name in ["Math", "Art", "History"] {
    s.insert_subject(subject(name)).await.unwrap();
  }

  let names: Vec<_> = s
    .list_subjects()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, ["Art", "History", "Math"]);
}

#[tokio::test]
async fn delete_subject_reports_absence() {
  let s = store().await;
  let subject = s.insert_subject(subject("Math")).await.unwrap();

  assert!(s.delete_subject(subject.id).await.unwrap());
  assert!(!s.delete_subject(subject.id).await.unwrap());
}

// ─── Homework ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_homework_roundtrip() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();

  let hw = s.insert_homework(draft(math.id, 11)).await.unwrap();
  assert!(!hw.completed);
  assert_eq!(s.get_homework(hw.id).await.unwrap(), Some(hw));
}

#[tokio::test]
async fn filters_split_and_order_homework() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();

  let mut ids = Vec::new();
  for day in [20, 9, 11, 1, 2] {
    ids.push(s.insert_homework(draft(math.id, day)).await.unwrap().id);
  }
  // Complete day 1 first, then day 2.
  s.update_homework(ids[3], HomeworkPatch::complete(Utc::now())).await.unwrap();
  tokio::time::sleep(Duration::from_millis(5)).await;
  s.update_homework(ids[4], HomeworkPatch::complete(Utc::now())).await.unwrap();

  let active = s.list_homework(HomeworkFilter::Active).await.unwrap();
  let days: Vec<_> = active.iter().map(|h| h.due_date.to_string()).collect();
  assert_eq!(days, ["2024-06-09", "2024-06-11", "2024-06-20"]);

  let archived = s.list_homework(HomeworkFilter::Archived).await.unwrap();
  let archived_ids: Vec<_> = archived.iter().map(|h| h.id).collect();
  assert_eq!(archived_ids, [ids[4], ids[3]]);
}

#[tokio::test]
async fn patch_complete_and_restore() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();
  let hw = s.insert_homework(draft(math.id, 11)).await.unwrap();

  let done = s
    .update_homework(hw.id, HomeworkPatch::complete(Utc::now()))
    .await
    .unwrap()
    .unwrap();
  assert!(done.completed);
  assert_eq!(s.get_homework(hw.id).await.unwrap(), Some(done.clone()));

  let back = s
    .update_homework(hw.id, HomeworkPatch::restore())
    .await
    .unwrap()
    .unwrap();
  assert!(!back.completed);
  assert_eq!(back.completed_at, None);
  assert_eq!(back.created_at, hw.created_at);
  assert_eq!(back.description, "p.5");
}

#[tokio::test]
async fn concurrent_patches_keep_each_others_columns() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();
  let due = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();

  for _ in 0..20 {
    let hw = s.insert_homework(draft(math.id, 11)).await.unwrap();
    let (done, edited) = tokio::join!(
      s.update_homework(hw.id, HomeworkPatch::complete(Utc::now())),
      s.update_homework(hw.id, HomeworkPatch::edit(HomeworkInput::new(math.id, due, "edited"))),
    );
    assert!(done.unwrap().is_some());
    assert!(edited.unwrap().is_some());

    let stored = s.get_homework(hw.id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.description, "edited");
    assert_eq!(stored.due_date, due);
  }
}

#[tokio::test]
async fn patch_returns_stored_row() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();
  let hw = s.insert_homework(draft(math.id, 11)).await.unwrap();

  let done = s
    .update_homework(hw.id, HomeworkPatch::complete(Utc::now()))
    .await
    .unwrap()
    .unwrap();
  let done_at = done.completed_at.unwrap();

  let edited = s
    .update_homework(hw.id, HomeworkPatch { description: Some("ch. 3".into()), ..Default::default() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(edited.description, "ch. 3");
  assert!(edited.completed);
  assert_eq!(edited.completed_at, Some(done_at));
  assert_eq!(s.get_homework(hw.id).await.unwrap(), Some(edited));
}

#[tokio::test]
async fn update_and_delete_missing_homework() {
  let s = store().await;
  let id = Uuid::new_v4();
  assert!(s.update_homework(id, HomeworkPatch::restore()).await.unwrap().is_none());
  assert!(!s.delete_homework(id).await.unwrap());
}

// ─── Live queries ────────────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_sees_writes() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();

  let mut active = s.subscribe_homework(HomeworkFilter::Active).await.unwrap();
  assert_eq!(active.next().await, Some(vec![]));

  let hw = s.insert_homework(draft(math.id, 11)).await.unwrap();
  let snapshot = tokio::time::timeout(Duration::from_secs(2), active.next())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(snapshot, vec![hw.clone()]);

  s.update_homework(hw.id, HomeworkPatch::complete(Utc::now()))
    .await
    .unwrap();
  let snapshot = tokio::time::timeout(Duration::from_secs(2), active.next())
    .await
    .unwrap()
    .unwrap();
  assert!(snapshot.is_empty());
}

#[tokio::test]
async fn subject_subscription_follows_deletes() {
  let s = store().await;
  let math = s.insert_subject(subject("Math")).await.unwrap();

  let mut subjects = s.subscribe_subjects().await.unwrap();
  assert_eq!(subjects.next().await.map(|v| v.len()), Some(1));

  s.delete_subject(math.id).await.unwrap();
  let snapshot = tokio::time::timeout(Duration::from_secs(2), subjects.next())
    .await
    .unwrap()
    .unwrap();
  assert!(snapshot.is_empty());
}
