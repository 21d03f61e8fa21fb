use noodles::bam;
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::{Op, op::Kind};
use noodles::sam::alignment::record_buf::{Cigar, RecordBuf, Sequence};
use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
use std::fs::{self, File};
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

const LINE_WIDTH: usize = 60;
pub const CHROMOSOMES: [(&str, usize); 2] = [("chr1", 2_000), ("chr2", 1_500)];

/// Features longer than 50 bp; `tiny` and `edge` are not.
const ANNOTATION: &str = "\
track name=utrs
chr1\t100\t400\tutr1\t0\t+
chr1\t500\t540\ttiny\t0\t+
chr1\t800\t1300\tutr2\t0\t-
chr2\t0\t50\tedge\t0\t+
chr2\t200\t900\tutr3\t0\t-
chr2\t1000\t1400\tutr4\t0\t+
";
pub const KEPT_FEATURES: [&str; 4] = ["utr1", "utr2", "utr3", "utr4"];

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct Dataset {
    pub base_dir: PathBuf,
    pub reference: PathBuf,
    pub annotation: PathBuf,
    pub output_dir: PathBuf,
}

pub fn create_dataset(label: &str) -> io::Result<Dataset> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base_dir = std::env::temp_dir().join("splash-tests").join(format!(
        "{}-{}-{}",
        std::process::id(),
        id,
        label
    ));
    if base_dir.exists() {
        fs::remove_dir_all(&base_dir)?;
    }
    fs::create_dir_all(&base_dir)?;

    let reference = base_dir.join("genome.fa");
    write_reference(&reference)?;
    let annotation = base_dir.join("utrs.bed");
    fs::write(&annotation, ANNOTATION)?;

    Ok(Dataset {
        output_dir: base_dir.join("output"),
        base_dir,
        reference,
        annotation,
    })
}

/// Deterministic pseudo-random bases (LCG), so every run sees the same genome.
pub fn chromosome_sequence(idx: usize) -> Vec<u8> {
    let (_, len) = CHROMOSOMES[idx];
    let mut state: u64 = 0x2545_f491 + idx as u64;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            b"ACGT"[(state >> 62) as usize]
        })
        .collect()
}

fn write_reference(path: &Path) -> io::Result<()> {
    let mut f = File::create(path)?;
    for (idx, (name, _)) in CHROMOSOMES.iter().enumerate() {
        writeln!(f, ">{name}")?;
        for line in chromosome_sequence(idx).chunks(LINE_WIDTH) {
            f.write_all(line)?;
            writeln!(f)?;
        }
    }
    Ok(())
}

/// A BAM with three reads mapped to `chr1`: one forward read over
/// `[start, start + len)` (1-based start) whose T bases have all become C, one
/// unconverted forward read over the same span, and one reverse read.
pub fn write_mapped_bam(path: &Path, start: usize, len: usize) -> io::Result<()> {
    let mut header = sam::Header::builder().set_header(Default::default());
    for (name, chrom_len) in CHROMOSOMES {
        let chrom_len =
            NonZeroUsize::new(chrom_len).ok_or_else(|| io::Error::other("empty chromosome"))?;
        header = header.add_reference_sequence(name, Map::<ReferenceSequence>::new(chrom_len));
    }
    let header = header.build();

    let genomic = chromosome_sequence(0)[start - 1..start - 1 + len].to_vec();
    let converted: Vec<u8> = genomic
        .iter()
        .map(|&b| if b == b'T' { b'C' } else { b })
        .collect();

    let mut writer = bam::io::Writer::new(File::create(path)?);
    writer.write_header(&header)?;
    for (seq, flags) in [
        (converted, Flags::empty()),
        (genomic.clone(), Flags::empty()),
        (genomic, Flags::REVERSE_COMPLEMENTED),
    ] {
        let mut record = RecordBuf::default();
        *record.flags_mut() = flags;
        *record.reference_sequence_id_mut() = Some(0);
        *record.alignment_start_mut() = Position::new(start);
        let mut cigar = Cigar::default();
        cigar.as_mut().push(Op::new(Kind::Match, len));
        *record.cigar_mut() = cigar;
        *record.sequence_mut() = Sequence::from(seq);
        writer.write_alignment_record(&header, &record)?;
    }
    writer.finish(&header)
}

pub fn t_count(start: usize, len: usize) -> usize {
    chromosome_sequence(0)[start - 1..start - 1 + len]
        .iter()
        .filter(|&&b| b == b'T')
        .count()
}
