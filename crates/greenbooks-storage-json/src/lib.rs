//! greenbooks-storage-json
//!
//! Filesystem-backed JSON persistence for [`Books`] snapshots and their
//! backups. Saves are atomic (tmp file + rename), so a crashed write never
//! leaves a half-serialized snapshot behind.

use std::{
    cmp::Reverse,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use greenbooks_core::{
    storage::{BooksBackupInfo, BooksStorage},
    CoreError,
};
use greenbooks_domain::Books;

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Root directories the backend works under.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub books_root: PathBuf,
    pub backup_root: PathBuf,
}

/// Filesystem-backed JSON persistence for books and their backups.
#[derive(Clone)]
pub struct JsonBooksStorage {
    paths: StoragePaths,
    retention: usize,
}

impl JsonBooksStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.books_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn books_path(&self, name: &str) -> PathBuf {
        self.paths
            .books_root
            .join(format!("{}.{}", canonical_name(name), FILE_EXTENSION))
    }

    /// Summaries of every stored snapshot, sorted by display name.
    pub fn list_books_metadata(&self) -> Result<Vec<BooksMetadata>, CoreError> {
        let mut rows = Vec::new();
        for slug in self.list_books()? {
            let books = self.load_books(&slug)?;
            rows.push(BooksMetadata {
                path: self.books_path(&slug),
                slug,
                name: books.name.clone(),
                created_at: books.created_at,
                updated_at: books.updated_at,
                account_count: books.accounts.len(),
                transaction_count: books.transactions.len(),
                entry_count: books.entries.len(),
                budget_row_count: books.budgets.len(),
            });
        }
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.paths.backup_root.join(canonical_name(name))
    }

    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        let mut backups = self.list_backups(name)?;
        backups.sort_by_key(|info| Reverse(parse_backup_timestamp(&info.id)));
        for stale in backups.into_iter().skip(self.retention) {
            let _ = fs::remove_file(stale.path);
        }
        Ok(())
    }
}

impl BooksStorage for JsonBooksStorage {
    fn save_books(&self, name: &str, books: &Books) -> Result<(), CoreError> {
        write_snapshot(books, &self.books_path(name))
    }

    fn load_books(&self, name: &str) -> Result<Books, CoreError> {
        read_snapshot(&self.books_path(name))
    }

    fn list_books(&self) -> Result<Vec<String>, CoreError> {
        if !self.paths.books_root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.paths.books_root)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_books(&self, name: &str) -> Result<(), CoreError> {
        let path = self.books_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn save_to_path(&self, books: &Books, path: &Path) -> Result<(), CoreError> {
        write_snapshot(books, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<Books, CoreError> {
        read_snapshot(path)
    }

    fn backup_books(
        &self,
        name: &str,
        books: &Books,
        note: Option<&str>,
    ) -> Result<BooksBackupInfo, CoreError> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let file_name = format!("{}.{}", stem, FILE_EXTENSION);
        let path = dir.join(&file_name);
        write_snapshot(books, &path)?;
        self.prune_backups(name)?;
        Ok(BooksBackupInfo {
            books: canonical_name(name),
            id: file_name,
            created_at: timestamp,
            path,
        })
    }

    fn list_backups(&self, name: &str) -> Result<Vec<BooksBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let slug = canonical_name(name);
        let mut backups = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                backups.push(BooksBackupInfo {
                    books: slug.clone(),
                    id: file_name.to_string(),
                    created_at: file_name.to_string(),
                    path: path.clone(),
                });
            }
        }
        backups.sort_by_key(|info| Reverse(parse_backup_timestamp(&info.id)));
        Ok(backups)
    }

    fn restore_backup(&self, backup: &BooksBackupInfo) -> Result<Books, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let target = self.books_path(&backup.books);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&backup.path, &target)?;
        read_snapshot(&target)
    }
}

/// Summary row for one stored snapshot.
#[derive(Debug, Clone)]
pub struct BooksMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub account_count: usize,
    pub transaction_count: usize,
    pub entry_count: usize,
    pub budget_row_count: usize,
}

/// Serializes a snapshot to `path` atomically.
pub fn write_snapshot(books: &Books, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(books)
        .map_err(|err| CoreError::Serde(err.to_string()))?;
    let tmp = tmp_path(path);
    let mut file = fs::File::create(&tmp)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a snapshot from `path`.
pub fn read_snapshot(path: &Path) -> Result<Books, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "books".into()
    } else {
        sanitized
    }
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if !sanitized.is_empty() && !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stem = file_name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
    let segments: Vec<&str> = stem.split('_').collect();
    // slug_YYYYMMDD_HHMM or slug_YYYYMMDD_HHMM_note
    segments.windows(2).find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if date.len() != 8 || time.len() != 4 {
            return None;
        }
        if !date.chars().chain(time.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
