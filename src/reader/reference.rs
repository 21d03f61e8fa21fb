use bio::io::fasta;
use log::{debug, warn};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{CustomError, Result};
use crate::reader::SequenceSource;

enum Backend {
    /// Random access through `<ref>.fai`.
    Indexed(fasta::IndexedReader<File>),
    /// Whole reference held in memory when no index is present.
    Loaded(HashMap<String, Vec<u8>>),
}

/// FASTA reference with random access by name and 0-based, half-open interval.
pub struct IndexedReference {
    backend: Backend,
    lengths: HashMap<String, u64>,
    path: PathBuf,
}

impl IndexedReference {
    pub fn open(path: &impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let read_err = |e| CustomError::ReadWithPath {
            source: e,
            path: path.clone(),
        };
        let fai_path = fai_path(&path);

        let (backend, lengths) = if fai_path.exists() {
            debug!("Using FASTA index {}", fai_path.display());
            let fai = File::open(&fai_path).map_err(|e| CustomError::ReadWithPath {
                source: e,
                path: fai_path.clone(),
            })?;
            let index = fasta::Index::new(fai).map_err(|e| CustomError::CsvRead {
                source: e,
                path: fai_path.clone(),
            })?;
            let lengths = index
                .sequences()
                .into_iter()
                .map(|seq| (seq.name, seq.len))
                .collect();
            let file = File::open(&path).map_err(read_err)?;
            let reader = fasta::IndexedReader::with_index(file, index);
            (Backend::Indexed(reader), lengths)
        } else {
            warn!(
                "No index found at {}, loading {} into memory",
                fai_path.display(),
                path.display()
            );
            let reader = fasta::Reader::new(File::open(&path).map_err(read_err)?);
            let mut sequences = HashMap::new();
            for record in reader.records() {
                let record = record.map_err(read_err)?;
                sequences.insert(record.id().to_string(), record.seq().to_vec());
            }
            let lengths = sequences
                .iter()
                .map(|(name, seq): (&String, &Vec<u8>)| (name.clone(), seq.len() as u64))
                .collect();
            (Backend::Loaded(sequences), lengths)
        };
        Ok(Self {
            backend,
            lengths,
            path,
        })
    }
}

impl SequenceSource for IndexedReference {
    fn sequence_len(&self, chrom: &str) -> Option<u64> {
        self.lengths.get(chrom).copied()
    }

    fn fetch(&mut self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let len = self
            .sequence_len(chrom)
            .ok_or_else(|| CustomError::UnknownSequence {
                chrom: chrom.to_string(),
            })?;
        if start > end || end > len {
            return Err(CustomError::ReferenceMismatch {
                chrom: chrom.to_string(),
                start,
                end,
                len,
            });
        }

        let mut seq = match &mut self.backend {
            Backend::Indexed(reader) => {
                let mut seq = Vec::with_capacity((end - start) as usize);
                if start < end {
                    let read_err = |e| CustomError::ReadWithPath {
                        source: e,
                        path: self.path.clone(),
                    };
                    reader.fetch(chrom, start, end).map_err(read_err)?;
                    reader.read(&mut seq).map_err(read_err)?;
                }
                seq
            }
            Backend::Loaded(sequences) => sequences
                .get(chrom)
                .map(|s| s[start as usize..end as usize].to_vec())
                .unwrap_or_default(),
        };
        seq.make_ascii_uppercase();
        Ok(seq)
    }
}

fn fai_path(fasta: &Path) -> PathBuf {
    let mut raw = OsString::from(fasta.as_os_str());
    raw.push(".fai");
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FASTA: &str = ">chr1 first\nACGTACGTAC\nGGGGCCCCTT\nAAC\n>chr2\nttttaaaa\n";
    const FAI: &str = "chr1\t23\t12\t10\t11\nchr2\t8\t44\t8\t9\n";

    #[test]
    fn fetches_across_line_breaks_with_and_without_fai() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        fs::write(&fasta, FASTA).unwrap();

        let mut loaded = IndexedReference::open(&fasta).unwrap();
        fs::write(dir.path().join("ref.fa.fai"), FAI).unwrap();
        let mut indexed = IndexedReference::open(&fasta).unwrap();
        assert!(matches!(loaded.backend, Backend::Loaded(_)));
        assert!(matches!(indexed.backend, Backend::Indexed(_)));

        for reference in [&mut loaded, &mut indexed] {
            assert_eq!(reference.sequence_len("chr1"), Some(23));
            assert_eq!(reference.sequence_len("chr2"), Some(8));
            assert_eq!(reference.fetch("chr1", 8, 13).unwrap(), b"ACGGG".to_vec());
            assert_eq!(reference.fetch("chr1", 20, 23).unwrap(), b"AAC".to_vec());
            assert_eq!(reference.fetch("chr2", 2, 6).unwrap(), b"TTAA".to_vec());
            assert!(reference.fetch("chr2", 3, 3).unwrap().is_empty());
        }
    }

    #[test]
    fn out_of_bounds_is_a_reference_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        fs::write(&fasta, FASTA).unwrap();
        let mut reference = IndexedReference::open(&fasta).unwrap();

        match reference.fetch("chr2", 4, 9).unwrap_err() {
            CustomError::ReferenceMismatch { len, .. } => assert_eq!(len, 8),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            reference.fetch("chrX", 0, 1).unwrap_err(),
            CustomError::UnknownSequence { .. }
        ));
    }

    #[test]
    fn malformed_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        fs::write(&fasta, FASTA).unwrap();
        fs::write(dir.path().join("ref.fa.fai"), "chr1\tnot-a-length\t12\t10\t11\n").unwrap();
        assert!(matches!(
            IndexedReference::open(&fasta),
            Err(CustomError::CsvRead { .. })
        ));
    }
}
