// Archive Selector - finds the dated daily archives and reads their members

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::ArchiveError;
use crate::parser::FileKind;

static ARCHIVE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8})\.zip$").expect("valid regex"));

/// A `<YYYYMMDD>.zip` file found in the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub date: NaiveDate,
}

impl ArchiveEntry {
    /// The 8-digit stem, which also prefixes every member name
    pub fn date_stem(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}

/// Archives in `dir`, most recent first. Subdirectories and files that are
/// not named like a real date plus `.zip` are skipped. An empty list is not
/// an error; an unreadable or non-directory path is.
pub fn list_archives(dir: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let dir_error = |source: std::io::Error| ArchiveError::SourceDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(dir).map_err(dir_error)?;
    if !metadata.is_dir() {
        return Err(dir_error(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }

    let mut archives = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let entry = entry.map_err(dir_error)?;
        if !entry.file_type().map_err(dir_error)?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(caps) = ARCHIVE_NAME.captures(name) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y%m%d") else {
            debug!(file = name, "skipping archive with impossible date");
            continue;
        };

        archives.push(ArchiveEntry {
            path: entry.path(),
            date,
        });
    }

    archives.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(archives)
}

/// The opened daily archive
pub struct DailyArchive {
    entry: ArchiveEntry,
    zip: ZipArchive<File>,
}

impl DailyArchive {
    pub fn open(entry: &ArchiveEntry) -> Result<Self, ArchiveError> {
        let not_a_zip = |source: zip::result::ZipError| ArchiveError::NotAZip {
            path: entry.path.clone(),
            source,
        };

        let file = File::open(&entry.path).map_err(|e| not_a_zip(e.into()))?;
        let zip = ZipArchive::new(file).map_err(not_a_zip)?;
        info!(archive = %entry.path.display(), members = zip.len(), "opened archive");

        Ok(DailyArchive {
            entry: entry.clone(),
            zip,
        })
    }

    pub fn entry(&self) -> &ArchiveEntry {
        &self.entry
    }

    fn archive_name(&self) -> String {
        self.entry.path.display().to_string()
    }

    /// Check that all four daily files are present
    pub fn verify_members(&self) -> Result<(), ArchiveError> {
        let stem = self.entry.date_stem();
        for kind in FileKind::ALL {
            let member = kind.member_name(&stem);
            if self.zip.index_for_name(&member).is_none() {
                return Err(ArchiveError::MissingMember {
                    archive: self.archive_name(),
                    member,
                });
            }
        }
        Ok(())
    }

    /// Name and full contents of one daily file
    pub fn member(&mut self, kind: FileKind) -> Result<(String, Vec<u8>), ArchiveError> {
        let member = kind.member_name(&self.entry.date_stem());
        let archive = self.archive_name();

        let mut file = self.zip.by_name(&member).map_err(|_| ArchiveError::MissingMember {
            archive: archive.clone(),
            member: member.clone(),
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|source| ArchiveError::Read {
                archive,
                member: member.clone(),
                source,
            })?;

        Ok((member, contents))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Write a zip at `path` with the given (name, contents) members
    pub(crate) fn write_zip(path: &Path, members: &[(String, String)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, contents) in members {
            writer.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn placeholder_members(stem: &str) -> Vec<(String, String)> {
        FileKind::ALL
            .iter()
            .map(|k| (k.member_name(stem), "So the size is not 0".to_string()))
            .collect()
    }

    #[test]
    fn test_arch_list_sorted_most_recent_first() {
        let dir = TempDir::new().unwrap();
        write_zip(&dir.path().join("20140101.zip"), &placeholder_members("20140101"));
        fs::copy(dir.path().join("20140101.zip"), dir.path().join("20130202.zip")).unwrap();
        fs::copy(dir.path().join("20140101.zip"), dir.path().join("20150202.zip")).unwrap();

        let archives = list_archives(dir.path()).unwrap();

        let stems: Vec<String> = archives.iter().map(|a| a.date_stem()).collect();
        assert_eq!(stems, vec!["20150202", "20140101", "20130202"]);
    }

    #[test]
    fn test_arch_list_ignores_other_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("20140101_product.txt"), "x").unwrap();
        fs::write(dir.path().join("notes.zip"), "x").unwrap();
        fs::write(dir.path().join("2014010.zip"), "x").unwrap();
        fs::write(dir.path().join("20141399.zip"), "x").unwrap();
        fs::write(dir.path().join("20140101.zip.bak"), "x").unwrap();
        fs::create_dir(dir.path().join("20140202.zip")).unwrap();
        fs::write(dir.path().join("20140303.zip"), "x").unwrap();

        let archives = list_archives(dir.path()).unwrap();

        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].date_stem(), "20140303");
    }

    #[test]
    fn test_arch_list_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(list_archives(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_arch_list_bad_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not_a_folder");
        fs::write(&file, "I am not a folder").unwrap();

        assert!(matches!(
            list_archives(&file),
            Err(ArchiveError::SourceDirectory { .. })
        ));
        assert!(matches!(
            list_archives(&dir.path().join("missing")),
            Err(ArchiveError::SourceDirectory { .. })
        ));
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("20140101.zip"), "Some text").unwrap();
        let entry = list_archives(dir.path()).unwrap().remove(0);

        let err = DailyArchive::open(&entry).err().unwrap();
        assert!(matches!(err, ArchiveError::NotAZip { .. }));
        assert_eq!(err.to_string(), "File is not a zip file");
    }

    #[test]
    fn test_members_and_verification() {
        let dir = TempDir::new().unwrap();
        let mut members = placeholder_members("20140101");
        write_zip(&dir.path().join("20140101.zip"), &members);
        let entry = list_archives(dir.path()).unwrap().remove(0);

        let mut archive = DailyArchive::open(&entry).unwrap();
        archive.verify_members().unwrap();
        let (name, contents) = archive.member(FileKind::Rate).unwrap();
        assert_eq!(name, "20140101_rate.txt");
        assert_eq!(contents, b"So the size is not 0");

        members.pop();
        write_zip(&dir.path().join("20140101.zip"), &members);
        let archive = DailyArchive::open(&entry).unwrap();
        let err = archive.verify_members().unwrap_err();
        assert!(err.to_string().contains("20140101_region.txt"));
    }
}
