use std::{io, path::PathBuf};

use common::data_uri::{self, DataUriError};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("invalid photo data: {0}")]
    Data(#[from] DataUriError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPhoto {
    pub file_id: String,
    pub file_name: String,
    pub url: String,
}

/// A stored photo as read back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoBlob {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Photo blobs on local disk, each reachable through a public link. A photo
/// lives at `<dir>/<id>/<file name>`.
pub struct PhotoStore {
    dir: PathBuf,
    public_url: String,
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

fn valid_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

impl PhotoStore {
    pub async fn open(dir: impl Into<PathBuf>, public_url: &str) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, id: &str) -> String {
        format!("{}/photos/{id}", self.public_url)
    }

    /// Decodes a `data:` URI and writes it out as `file_name` under a fresh
    /// id.
    pub async fn save(&self, file_name: String, data: &str) -> Result<StoredPhoto, PhotoError> {
        if !valid_file_name(&file_name) {
            return Err(PhotoError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bad photo file name {file_name:?}"),
            )));
        }
        let bytes = data_uri::decode(data)?;
        let id = uuidv7::create();
        let folder = self.dir.join(&id);
        fs::create_dir(&folder).await?;
        let written = async {
            let mut file = File::create_new(folder.join(&file_name)).await?;
            file.write_all(&bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_dir_all(&folder).await;
            return Err(e.into());
        }
        log::info!("stored {file_name} ({} bytes) as {id}", bytes.len());
        Ok(StoredPhoto {
            url: self.url_for(&id),
            file_id: id,
            file_name,
        })
    }

    /// The stored photo, or `None` for an unknown id.
    pub async fn read(&self, id: &str) -> io::Result<Option<PhotoBlob>> {
        if !valid_id(id) {
            return Ok(None);
        }
        let mut entries = match fs::read_dir(self.dir.join(id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(entry) = entries.next_entry().await? else {
            return Ok(None);
        };
        Ok(Some(PhotoBlob {
            file_name: entry.file_name().to_string_lossy().into_owned(),
            bytes: fs::read(entry.path()).await?,
        }))
    }
}
