//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use homeroom_core::{
  feed::{ChangeFeed, Collection, subscribe_with},
  homework::{Homework, HomeworkPatch, NewHomework},
  store::{DocumentStore, HomeworkFilter, Subscription},
  subject::{NewSubject, Subject},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    HOMEWORK_COLUMNS, HomeworkPatchRow, HomeworkRow, RawHomework, RawSubject, SUBJECT_COLUMNS,
    encode_uuid, truncate_dt,
  },
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Homeroom document store backed by a single SQLite file.
///
/// Clones share the inner connection and change feed, so they
/// notify the same subscribers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  feed: ChangeFeed,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, feed: ChangeFeed::new() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, feed: ChangeFeed::new() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY name ASC"))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn query_homework(&self, filter: HomeworkFilter) -> Result<Vec<Homework>> {
    let order = match filter {
      HomeworkFilter::Active => "due_date ASC",
      HomeworkFilter::Archived => "completed_at DESC",
    };
    let completed = filter.completed();

    let raws: Vec<RawHomework> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {HOMEWORK_COLUMNS} FROM homework WHERE completed = ?1 ORDER BY {order}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![completed], RawHomework::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHomework::into_homework).collect()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Live queries ──────────────────────────────────────────────────────────

  async fn subscribe_subjects(&self) -> Result<Subscription<Subject>> {
    let store = self.clone();
    subscribe_with(&self.feed, Collection::Subjects, move || {
      let store = store.clone();
      async move { store.query_subjects().await }
    })
    .await
  }

  async fn subscribe_homework(&self, filter: HomeworkFilter) -> Result<Subscription<Homework>> {
    let store = self.clone();
    subscribe_with(&self.feed, Collection::Homework, move || {
      let store = store.clone();
      async move { store.query_homework(filter).await }
    })
    .await
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn list_subjects(&self) -> Result<Vec<Subject>> { self.query_subjects().await }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ?1"),
              rusqlite::params![id_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn insert_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject { id: Uuid::new_v4(), name: input.name, color: input.color };

    let id_str = encode_uuid(subject.id);
    let name = subject.name.clone();
    let color = subject.color.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (id, name, color) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, color],
        )?;
        Ok(())
      })
      .await?;

    self.feed.notify(Collection::Subjects);
    Ok(subject)
  }

  async fn delete_subject(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        let n = conn.execute("DELETE FROM subjects WHERE id = ?1", rusqlite::params![id_str])?;
        Ok(n > 0)
      })
      .await?;

    if removed {
      self.feed.notify(Collection::Subjects);
    }
    Ok(removed)
  }

  // ── Homework ──────────────────────────────────────────────────────────────

  async fn list_homework(&self, filter: HomeworkFilter) -> Result<Vec<Homework>> {
    self.query_homework(filter).await
  }

  async fn get_homework(&self, id: Uuid) -> Result<Option<Homework>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawHomework> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {HOMEWORK_COLUMNS} FROM homework WHERE id = ?1"),
              rusqlite::params![id_str],
              RawHomework::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawHomework::into_homework).transpose()
  }

  async fn insert_homework(&self, input: NewHomework) -> Result<Homework> {
    let mut hw = input.into_homework(Uuid::new_v4());
    hw.created_at = truncate_dt(hw.created_at);
    let row = HomeworkRow::encode(&hw);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO homework ({HOMEWORK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
          rusqlite::params![
            row.id,
            row.subject_id,
            row.due_date,
            row.description,
            row.completed,
            row.created_at,
            row.completed_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.feed.notify(Collection::Homework);
    Ok(hw)
  }

  async fn update_homework(&self, id: Uuid, patch: HomeworkPatch) -> Result<Option<Homework>> {
    let id_str = encode_uuid(id);
    let row = HomeworkPatchRow::encode(patch);

    // Single statement: concurrent patches to one row only touch their own
    // columns.
    let raw: Option<RawHomework> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE homework
                    SET subject_id   = COALESCE(?2, subject_id),
                        due_date     = COALESCE(?3, due_date),
                        description  = COALESCE(?4, description),
                        completed    = COALESCE(?5, completed),
                        completed_at = CASE WHEN ?6 THEN ?7 ELSE completed_at END
                  WHERE id = ?1
              RETURNING {HOMEWORK_COLUMNS}"
              ),
              rusqlite::params![
                id_str,
                row.subject_id,
                row.due_date,
                row.description,
                row.completed,
                row.set_completed_at,
                row.completed_at,
              ],
              RawHomework::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    let Some(raw) = raw else {
      tracing::debug!(%id, "update targeted missing homework");
      return Ok(None);
    };

    self.feed.notify(Collection::Homework);
    raw.into_homework().map(Some)
  }

  async fn delete_homework(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        let n = conn.execute("DELETE FROM homework WHERE id = ?1", rusqlite::params![id_str])?;
        Ok(n > 0)
      })
      .await?;

    if removed {
      self.feed.notify(Collection::Homework);
    }
    Ok(removed)
  }
}
