//! Filesystem content store and the `/content` upload endpoints.
//!
//! Blobs live at `<root>/<first two hex digits>/<full hash>`. A blob is
//! written to a temporary sibling and renamed into place, so a reader never
//! sees a partial file.

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Json,
  extract::{Path as UrlPath, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use helpdesk_api::Caller;
use helpdesk_core::content::{ContentHash, ContentStore};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FsContentStore {
  root: PathBuf,
}

impl FsContentStore {
  /// Use `root` as the blob directory, creating it if needed.
  pub async fn open(root: impl AsRef<Path>) -> io::Result<Self> {
    let root = root.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root })
  }

  fn path_for(&self, hash: &ContentHash) -> PathBuf {
    let s = hash.as_str();
    self.root.join(&s[..2]).join(s)
  }
}

impl ContentStore for FsContentStore {
  type Error = io::Error;

  async fn put(&self, bytes: Vec<u8>) -> io::Result<ContentHash> {
    let hash = ContentHash::of(&bytes);
    let path = self.path_for(&hash);
    if tokio::fs::try_exists(&path).await? {
      return Ok(hash);
    }
    if let Some(dir) = path.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = path.with_extension("partial");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    tracing::debug!(%hash, size = bytes.len(), "stored blob");
    Ok(hash)
  }

  async fn get<'a>(&'a self, hash: &'a ContentHash) -> io::Result<Option<Vec<u8>>> {
    match tokio::fs::read(self.path_for(hash)).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Uploaded {
  pub hash: ContentHash,
  pub size: usize,
}

/// `POST /content`: raw request body; returns 201 + `{"hash", "size"}`.
pub async fn upload<C: ContentStore>(
  State(store): State<Arc<C>>,
  Caller(caller): Caller,
  body: Bytes,
) -> Result<impl IntoResponse, Error> {
  let size = body.len();
  let hash = store
    .put(body.to_vec())
    .await
    .map_err(|e| Error::Content(Box::new(e)))?;
  tracing::info!(%caller, %hash, size, "content uploaded");
  Ok((StatusCode::CREATED, Json(Uploaded { hash, size })))
}

/// `GET /content/:hash`
pub async fn download<C: ContentStore>(
  State(store): State<Arc<C>>,
  _caller: Caller,
  UrlPath(hash): UrlPath<String>,
) -> Result<impl IntoResponse, Error> {
  let hash = ContentHash::parse(&hash).map_err(|e| Error::BadRequest(e.to_string()))?;
  let bytes = store
    .get(&hash)
    .await
    .map_err(|e| Error::Content(Box::new(e)))?
    .ok_or(Error::NotFound)?;
  Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}
