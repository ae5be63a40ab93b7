use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use chrono::{DateTime, Local};
use rand::Rng;
use tokio::{fs, io::AsyncWriteExt};

use super::Photo;

pub const PHOTO_EXTENSION: &str = ".png";
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Standard alphabet, but lenient about padding and trailing bits like browser encoders.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub photos: u64,
    pub bytes: u64,
}

/// Photo storage backed by a single directory. The directory listing is the only index.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the storage root if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        libs::util::ensure_dir(&root)
            .with_context(|| format!("cannot create storage dir {}", root.display()))?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All `.png` entries, newest filename first.
    pub async fn list_photos(&self) -> Result<Vec<Photo>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut photos = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(filename) = entry.file_name().into_string() else {
                tracing::warn!("skipping non UTF-8 entry in {}", self.root.display());
                continue;
            };
            if !filename.ends_with(PHOTO_EXTENSION) {
                continue;
            }

            let modified: DateTime<Local> = entry.metadata().await?.modified()?.into();
            photos.push(Photo::new(filename, &modified));
        }

        photos.sort_by(|a, b| b.filename.cmp(&a.filename));
        Ok(photos)
    }

    /// Decodes `payload` (optionally data-URI prefixed) and stores it under a fresh name.
    pub async fn save_photo(&self, payload: &str) -> Result<Photo> {
        let bytes = decode_payload(payload)?;
        let filename = generate_filename();
        let path = self.root.join(&filename);
        let tmp = self.root.join(format!(".{filename}.tmp"));

        let written = match write_file(&tmp, &bytes).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        tracing::debug!("saved {} ({} bytes)", path.display(), bytes.len());

        Ok(Photo::new(filename, &Local::now()))
    }

    /// Returns `false` when no such file exists.
    pub async fn delete_photo(&self, filename: &str) -> Result<bool> {
        if !is_safe_filename(filename) {
            bail!("invalid filename: {filename}");
        }

        let path = self.root.join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("removed file {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn stats(&self) -> Result<StorageStats> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut stats = StorageStats::default();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_name().to_string_lossy().ends_with(PHOTO_EXTENSION) {
                continue;
            }
            stats.photos += 1;
            stats.bytes += entry.metadata().await?.len();
        }
        Ok(stats)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut dest = fs::File::create(path).await?;
    dest.write_all(bytes).await?;
    dest.flush().await?;
    dest.sync_all().await
}

fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let data = payload.strip_prefix(DATA_URI_PREFIX).unwrap_or(payload);
    // line-wrapped encoders (MIME, `base64` CLI) are accepted
    let data: Vec<u8> = data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    PAYLOAD_ENGINE
        .decode(data)
        .context("invalid base64 image data")
}

/// `foto_<unix millis>_<1000..=9999>.png`
pub fn generate_filename() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::rng().random_range(1000..=9999);
    format!("foto_{millis}_{suffix}{PHOTO_EXTENSION}")
}

/// A single plain path component: no separators, no `.`/`..`, no NUL.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_follow_the_convention() {
        let name = generate_filename();
        let stem = name
            .strip_prefix("foto_")
            .and_then(|s| s.strip_suffix(".png"))
            .unwrap();
        let (millis, suffix) = stem.split_once('_').unwrap();

        assert!(millis.parse::<i64>().unwrap() > 0);
        let suffix: u32 = suffix.parse().unwrap();
        assert!((1000..=9999).contains(&suffix));
    }

    #[test]
    fn data_uri_prefix_is_optional() {
        assert_eq!(
            decode_payload("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_payload("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn whitespace_inside_payload_is_ignored() {
        assert_eq!(
            decode_payload("data:image/png;base64,aGVs\nbG8=").unwrap(),
            b"hello"
        );
        assert_eq!(decode_payload(" aGVs bG8=\r\n").unwrap(), b"hello");
        assert_eq!(decode_payload("aG\tVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn other_data_uri_prefixes_are_not_stripped() {
        assert!(decode_payload("data:image/jpeg;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn garbage_payload_fails_to_decode() {
        let err = decode_payload("not*base64!").unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid base64 image data"));
    }

    #[test]
    fn unsafe_filenames_are_rejected() {
        for name in ["", ".", "..", "../x.png", "a/b.png", "a\\b.png", "x\0.png"] {
            assert!(!is_safe_filename(name), "{name:?} should be rejected");
        }
        for name in ["foto_1_1000.png", "..hidden.png", "a..b.png"] {
            assert!(is_safe_filename(name), "{name:?} should be accepted");
        }
    }

    #[tokio::test]
    async fn save_list_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path());

        let photo = store.save_photo("aGVsbG8=").await.unwrap();
        assert_eq!(
            std::fs::read(tmp.path().join(&photo.filename)).unwrap(),
            b"hello"
        );

        let listed = store.list_photos().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, photo.filename);
        assert_eq!(listed[0].url, photo.url);

        assert!(store.delete_photo(&photo.filename).await.unwrap());
        assert!(!store.delete_photo(&photo.filename).await.unwrap());
        assert!(store.list_photos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_skips_non_png_and_sorts_descending() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["foto_1_1000.png", "foto_3_1000.png", "foto_2_1000.png", "notes.txt"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::write(tmp.path().join(".foto_4_1000.png.tmp"), b"x").unwrap();

        let store = PhotoStore::new(tmp.path());
        let names: Vec<_> = store
            .list_photos()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.filename)
            .collect();
        assert_eq!(
            names,
            ["foto_3_1000.png", "foto_2_1000.png", "foto_1_1000.png"]
        );
    }

    #[tokio::test]
    async fn failed_decode_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path());

        assert!(store.save_photo("%%%").await.is_err());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_root_surfaces_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path().join("gone"));

        assert!(store.list_photos().await.is_err());
        assert!(store.save_photo("aGVsbG8=").await.is_err());
    }

    #[tokio::test]
    async fn delete_refuses_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("fotos");
        let store = PhotoStore::open(&root).unwrap();
        std::fs::write(tmp.path().join("secret.png"), b"x").unwrap();

        assert!(store.delete_photo("../secret.png").await.is_err());
        assert!(tmp.path().join("secret.png").exists());
    }

    #[tokio::test]
    async fn stats_count_only_photos() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("foto_1_1000.png"), b"abc").unwrap();
        std::fs::write(tmp.path().join("foto_2_1000.png"), b"de").unwrap();
        std::fs::write(tmp.path().join("readme.md"), b"ignored").unwrap();

        let stats = PhotoStore::new(tmp.path()).stats().await.unwrap();
        assert_eq!(stats, StorageStats { photos: 2, bytes: 5 });
    }
}
