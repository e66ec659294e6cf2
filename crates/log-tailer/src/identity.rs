//! Stable file identity.

use outbox_database::FileIdentity;
use std::fs::Metadata;

/// Identity of the file behind `meta`, as (device, inode).
#[cfg(unix)]
pub fn file_identity(meta: &Metadata) -> FileIdentity {
    use std::os::unix::fs::MetadataExt;
    FileIdentity {
        device: meta.dev(),
        inode: meta.ino(),
    }
}

/// Without inodes every file looks the same; rotation then shows up only
/// as truncation.
#[cfg(not(unix))]
pub fn file_identity(_meta: &Metadata) -> FileIdentity {
    FileIdentity {
        device: 0,
        inode: 0,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_identity_follows_file_not_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let moved = dir.path().join("app.log.1");

        std::fs::write(&path, "one\n").unwrap();
        let before = file_identity(&std::fs::metadata(&path).unwrap());

        std::fs::rename(&path, &moved).unwrap();
        assert_eq!(file_identity(&std::fs::metadata(&moved).unwrap()), before);

        std::fs::write(&path, "two\n").unwrap();
        assert_ne!(file_identity(&std::fs::metadata(&path).unwrap()), before);
    }
}
