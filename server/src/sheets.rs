//! A spreadsheet on disk.
//!
//! A workbook is a directory and each sheet is a JSON-Lines file holding one
//! JSON array per row. The first row of every sheet is its header.

use std::{io, path::PathBuf};

use serde_json::Value;
use thiserror::Error;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

pub type Row = Vec<Value>;

pub mod sheet {
    pub const JOB_SITES: &str = "job_sites";
    pub const CREW_MEMBERS: &str = "crew_members";
    pub const FORM_SUBMISSIONS: &str = "form_submissions";
    pub const MATERIALS_USED: &str = "materials_used";
    pub const MATERIALS_NEEDED: &str = "materials_needed";
    pub const PHOTOS: &str = "photos";
}

/// Header written when a sheet is created by an append.
pub fn header(name: &str) -> &'static [&'static str] {
    match name {
        sheet::JOB_SITES => &["id", "name", "address"],
        sheet::CREW_MEMBERS => &["id", "name"],
        sheet::FORM_SUBMISSIONS => &[
            "submission_id",
            "job_id",
            "crew_member_id",
            "submitted_at",
            "trade_task_type",
            "work_performed",
            "location_on_site",
            "status",
            "issues_concerns",
            "weather_conditions",
            "device_info",
        ],
        sheet::MATERIALS_USED | sheet::MATERIALS_NEEDED => {
            &["material_id", "submission_id", "material"]
        }
        sheet::PHOTOS => &["photo_id", "submission_id", "url", "caption", "uploaded_at"],
        _ => &[],
    }
}

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheet not found: {0}")]
    NotFound(String),

    #[error("I/O error on sheet {sheet}: {source}")]
    Io {
        sheet: String,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt row {line} in sheet {sheet}: {reason}")]
    Corrupt {
        sheet: String,
        line: usize,
        reason: String,
    },
}

/// Renders a cell the way a spreadsheet would show it.
pub fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub struct Workbook {
    dir: PathBuf,
    /** Appends from concurrent requests are applied one at a time. */
    writer: Mutex<()>,
}

impl Workbook {
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            writer: Mutex::new(()),
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.jsonl"))
    }

    /// Every row of the sheet, header included.
    pub async fn rows(&self, name: &str) -> Result<Vec<Row>, SheetError> {
        let text = match fs::read_to_string(self.path(name)).await {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SheetError::NotFound(name.to_string()))
            }
            Err(source) => {
                return Err(SheetError::Io {
                    sheet: name.to_string(),
                    source,
                })
            }
        };
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| SheetError::Corrupt {
                    sheet: name.to_string(),
                    line: i + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Rows below the header.
    pub async fn data_rows(&self, name: &str) -> Result<Vec<Row>, SheetError> {
        Ok(self.rows(name).await?.into_iter().skip(1).collect())
    }

    pub async fn append_row(&self, name: &str, row: Row) -> Result<(), SheetError> {
        self.append_rows(name, vec![row]).await
    }

    /// Appends rows in order, creating the sheet with its header if needed.
    pub async fn append_rows(&self, name: &str, rows: Vec<Row>) -> Result<(), SheetError> {
        let io_err = |source| SheetError::Io {
            sheet: name.to_string(),
            source,
        };
        let _guard = self.writer.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))
            .await
            .map_err(io_err)?;

        let mut buf = Vec::new();
        if file.metadata().await.map_err(io_err)?.len() == 0 {
            let header: Row = header(name).iter().map(|h| Value::from(*h)).collect();
            push_line(&mut buf, &header);
        }
        for row in &rows {
            push_line(&mut buf, row);
        }
        file.write_all(&buf).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        file.sync_data().await.map_err(io_err)?;
        Ok(())
    }
}

fn push_line(buf: &mut Vec<u8>, row: &Row) {
    // A Vec<Value> always serializes.
    if let Ok(mut line) = serde_json::to_vec(row) {
        line.push(b'\n');
        buf.extend_from_slice(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[actix_web::test]
    async fn append_creates_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let book = Workbook::open(dir.path()).await.unwrap();
        book.append_row(sheet::CREW_MEMBERS, vec![json!("C1"), json!("Ana")])
            .await
            .unwrap();
        book.append_rows(
            sheet::CREW_MEMBERS,
            vec![vec![json!("C2"), json!("Bo")], vec![json!(3), json!("Cy")]],
        )
        .await
        .unwrap();

        let rows = book.rows(sheet::CREW_MEMBERS).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec![json!("id"), json!("name")]);
        let data = book.data_rows(sheet::CREW_MEMBERS).await.unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(cell_text(data[2].first()), "3");
        assert_eq!(cell_text(data[2].get(5)), "");
    }

    #[actix_web::test]
    async fn missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let book = Workbook::open(dir.path()).await.unwrap();
        assert!(matches!(
            book.rows(sheet::JOB_SITES).await,
            Err(SheetError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn corrupt_rows_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let book = Workbook::open(dir.path()).await.unwrap();
        std::fs::write(
            dir.path().join("job_sites.jsonl"),
            "[\"id\",\"name\",\"address\"]\n\n{oops\n",
        )
        .unwrap();
        match book.rows(sheet::JOB_SITES).await {
            Err(SheetError::Corrupt { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[actix_web::test]
    async fn concurrent_appends_keep_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let book = std::sync::Arc::new(Workbook::open(dir.path()).await.unwrap());
        let mut tasks = Vec::new();
        for i in 0..20 {
            let book = book.clone();
            tasks.push(tokio::spawn(async move {
                book.append_row(sheet::PHOTOS, vec![json!(i)]).await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        let rows = book.rows(sheet::PHOTOS).await.unwrap();
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[0][0], json!("photo_id"));
    }
}
