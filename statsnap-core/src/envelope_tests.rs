/*!
Tests for the snapshot envelope including corruption and version handling.
*/

#[cfg(test)]
mod tests {
    use crate::envelope::{
        read_envelope, read_header, write_envelope, write_envelope_at, SnapshotHeader,
        CURRENT_FORMAT_VERSION, HEADER_LEN,
    };
    use crate::StatsError;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_envelope_roundtrip() {
        let archive = b"\x05\x00\x00\x00\x04item";
        let (header, sealed) = write_envelope(archive);

        assert_eq!(sealed.len(), HEADER_LEN + archive.len());
        assert_eq!(&sealed[..4], b"STSN");

        let (read, body) = read_envelope(&sealed).unwrap();
        assert_eq!(read, header);
        assert_eq!(body, archive);
        assert_eq!(read.format_version, CURRENT_FORMAT_VERSION);

        // Timestamp should be close to current time
        let time_diff = (Utc::now() - read.created_at).num_seconds().abs();
        assert!(time_diff <= 5);
    }

    #[test]
    fn test_header_keeps_millisecond_timestamp() {
        let created = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap();
        let (_, sealed) = write_envelope_at(b"", created);
        let (header, body) = read_header(&sealed).unwrap();
        assert_eq!(header.created_at, created);
        assert!(body.is_empty());
    }

    #[test]
    fn test_known_hash() {
        assert_eq!(
            SnapshotHeader::compute_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_corrupted_archive_fails_integrity() {
        let (_, mut sealed) = write_envelope(b"some archive bytes");
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        match read_envelope(&sealed) {
            Err(StatsError::IntegrityCheckFailed { expected, actual }) => {
                assert_ne!(expected, actual);
                assert_eq!(expected.len(), 64);
            }
            other => panic!("expected integrity failure, got {other:?}"),
        }
        // the header alone still parses
        assert!(read_header(&sealed).is_ok());
    }

    #[test]
    fn test_bad_magic() {
        let (_, mut sealed) = write_envelope(b"x");
        sealed[0] = b'P';
        assert!(matches!(
            read_envelope(&sealed),
            Err(StatsError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            read_envelope(b"STSN\x02\x00"),
            Err(StatsError::InvalidFormat(_))
        ));
        assert!(matches!(read_envelope(&[]), Err(StatsError::InvalidFormat(_))));
    }

    #[test]
    fn test_unsupported_versions() {
        for version in [1u16, CURRENT_FORMAT_VERSION + 1] {
            let (_, mut sealed) = write_envelope(b"x");
            sealed[4..6].copy_from_slice(&version.to_le_bytes());
            match read_envelope(&sealed) {
                Err(StatsError::UnsupportedVersion { found, .. }) => assert_eq!(found, version),
                other => panic!("expected unsupported version, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_header_compatibility() {
        let mut header = SnapshotHeader::for_archive(b"x");
        assert!(header.is_compatible());
        header.format_version = CURRENT_FORMAT_VERSION + 1;
        assert!(!header.is_compatible());
    }

    #[test]
    fn test_header_serialization_roundtrip() {
        let header = SnapshotHeader::for_archive(b"payload");
        let json = serde_json::to_string(&header).unwrap();
        let back: SnapshotHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }
}
