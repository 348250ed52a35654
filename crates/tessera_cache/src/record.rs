//! Per-source artifact records and their fixed binary layout.
//!
//! A record is stored as `i32 metadata length | metadata | i32 output length
//! | output`, lengths big-endian, with no padding and no checksum. Equal
//! records always encode to equal bytes.

/// Width of each length prefix.
const LEN_PREFIX: usize = 4;

/// The cached result of compiling one source file.
///
/// Records are replaced wholesale when their source is recompiled; there is
/// no partial update.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ArtifactRecord {
    metadata: Vec<u8>,
    output: Vec<u8>,
}

/// Layout violations found while decoding or encoding a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Fewer bytes remain than a length prefix or section requires.
    #[error("{section} needs {expected} bytes but only {remaining} remain")]
    Truncated {
        /// The section being read.
        section: &'static str,
        /// Bytes required.
        expected: usize,
        /// Bytes left in the input.
        remaining: usize,
    },

    /// A length prefix is negative.
    #[error("{section} length {length} is negative")]
    NegativeLength {
        /// The section whose prefix is negative.
        section: &'static str,
        /// The decoded prefix.
        length: i32,
    },

    /// Bytes remain after the output section.
    #[error("{count} trailing bytes after output")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },

    /// A section is too large for a 32-bit length prefix.
    #[error("{section} of {length} bytes does not fit a 32-bit length")]
    TooLarge {
        /// The oversized section.
        section: &'static str,
        /// Its length.
        length: usize,
    },
}

impl ArtifactRecord {
    /// Creates a record from its metadata and compiled output.
    pub fn new(metadata: impl Into<Vec<u8>>, output: impl Into<Vec<u8>>) -> Self {
        Self {
            metadata: metadata.into(),
            output: output.into(),
        }
    }

    /// Structural metadata bytes.
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Compiled output bytes.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consumes the record, returning `(metadata, output)`.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.metadata, self.output)
    }

    /// Encodes the record in its fixed layout.
    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        let mut out =
            Vec::with_capacity(2 * LEN_PREFIX + self.metadata.len() + self.output.len());
        write_section(&mut out, "metadata", &self.metadata)?;
        write_section(&mut out, "output", &self.output)?;
        Ok(out)
    }

    /// Decodes a record, requiring the input to be consumed exactly.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut reader = Reader { bytes, pos: 0 };
        let metadata = reader.section("metadata")?.to_vec();
        let output = reader.section("output")?.to_vec();
        let count = bytes.len() - reader.pos;
        if count != 0 {
            return Err(RecordError::TrailingBytes { count });
        }
        Ok(Self { metadata, output })
    }
}

impl std::fmt::Debug for ArtifactRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactRecord")
            .field("metadata_len", &self.metadata.len())
            .field("output_len", &self.output.len())
            .finish()
    }
}

fn write_section(
    out: &mut Vec<u8>,
    section: &'static str,
    data: &[u8],
) -> Result<(), RecordError> {
    let len = i32::try_from(data.len()).map_err(|_| RecordError::TooLarge {
        section,
        length: data.len(),
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(data);
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, section: &'static str, n: usize) -> Result<&'a [u8], RecordError> {
        let remaining = self.bytes.len() - self.pos;
        if n > remaining {
            return Err(RecordError::Truncated {
                section,
                expected: n,
                remaining,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn section(&mut self, section: &'static str) -> Result<&'a [u8], RecordError> {
        let mut prefix = [0u8; LEN_PREFIX];
        prefix.copy_from_slice(self.take(section, LEN_PREFIX)?);
        let length = i32::from_be_bytes(prefix);
        let n = usize::try_from(length)
            .map_err(|_| RecordError::NegativeLength { section, length })?;
        self.take(section, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_length_prefixed_big_endian() {
        let record = ArtifactRecord::new(b"meta".to_vec(), b"out!!".to_vec());
        let bytes = record.encode().unwrap();
        assert_eq!(
            bytes,
            [
                &[0, 0, 0, 4][..],
                &b"meta"[..],
                &[0, 0, 0, 5][..],
                &b"out!!"[..],
            ]
            .concat()
        );
    }

    #[test]
    fn empty_record_is_eight_zero_bytes() {
        let bytes = ArtifactRecord::default().encode().unwrap();
        assert_eq!(bytes, vec![0u8; 8]);
        assert_eq!(
            ArtifactRecord::decode(&bytes).unwrap(),
            ArtifactRecord::default()
        );
    }

    #[test]
    fn identical_records_encode_identically() {
        let a = ArtifactRecord::new(vec![1u8, 2, 3], vec![9u8]);
        let b = ArtifactRecord::new(vec![1u8, 2, 3], vec![9u8]);
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }

    #[test]
    fn empty_input_is_truncated() {
        assert_eq!(
            ArtifactRecord::decode(&[]).unwrap_err(),
            RecordError::Truncated {
                section: "metadata",
                expected: 4,
                remaining: 0
            }
        );
    }

    #[test]
    fn length_exceeding_input_rejected() {
        let mut bytes = 40i32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert_eq!(
            ArtifactRecord::decode(&bytes).unwrap_err(),
            RecordError::Truncated {
                section: "metadata",
                expected: 40,
                remaining: 3
            }
        );
    }

    #[test]
    fn missing_output_section_rejected() {
        let mut bytes = 1i32.to_be_bytes().to_vec();
        bytes.push(7);
        bytes.extend_from_slice(&[0, 0]);
        assert!(matches!(
            ArtifactRecord::decode(&bytes).unwrap_err(),
            RecordError::Truncated {
                section: "output",
                ..
            }
        ));
    }

    #[test]
    fn negative_length_rejected() {
        let bytes = (-1i32).to_be_bytes();
        assert_eq!(
            ArtifactRecord::decode(&bytes).unwrap_err(),
            RecordError::NegativeLength {
                section: "metadata",
                length: -1
            }
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = ArtifactRecord::new(vec![1u8], vec![2u8]).encode().unwrap();
        bytes.push(0xff);
        assert_eq!(
            ArtifactRecord::decode(&bytes).unwrap_err(),
            RecordError::TrailingBytes { count: 1 }
        );
    }

    #[test]
    fn debug_shows_lengths_only() {
        let record = ArtifactRecord::new(vec![0u8; 3], vec![0u8; 10]);
        let s = format!("{record:?}");
        assert!(s.contains("metadata_len: 3"));
        assert!(s.contains("output_len: 10"));
    }

    mod proptest_codec {
        use super::super::ArtifactRecord;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decode_inverts_encode(
                metadata in proptest::collection::vec(any::<u8>(), 0..512),
                output in proptest::collection::vec(any::<u8>(), 0..512),
            ) {
                let record = ArtifactRecord::new(metadata, output);
                let bytes = record.encode().unwrap();
                prop_assert_eq!(bytes.len(), 8 + record.metadata().len() + record.output().len());
                prop_assert_eq!(ArtifactRecord::decode(&bytes).unwrap(), record);
            }

            #[test]
            fn truncation_never_decodes(
                metadata in proptest::collection::vec(any::<u8>(), 0..64),
                output in proptest::collection::vec(any::<u8>(), 0..64),
                cut in 1usize..8,
            ) {
                let bytes = ArtifactRecord::new(metadata, output).encode().unwrap();
                let keep = bytes.len().saturating_sub(cut);
                prop_assert!(ArtifactRecord::decode(&bytes[..keep]).is_err());
            }
        }
    }
}
