use bio::io::fasta;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CustomError, Result};
use crate::model::{TurnoverRecord, UtrModel};
use crate::reader::model::EXPRESSION_HEADER;
use crate::simulate::sample::UtrSummary;
use crate::sweep::ManifestRow;

const SUMMARY_HEADER: [&str; 14] = [
    "chromosome",
    "start",
    "end",
    "name",
    "length",
    "strand",
    "half_life",
    "labeled_fraction",
    "reads",
    "labeled_reads",
    "tc_reads",
    "t_count",
    "conversions",
    "conversion_rate",
];

fn create(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).map_err(|e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    })?;
    Ok(BufWriter::new(f))
}

fn write_err(path: &Path) -> impl Fn(std::io::Error) -> CustomError + '_ {
    move |e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    }
}

fn tsv_writer(path: &Path, has_headers: bool) -> Result<csv::Writer<File>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .from_path(path)
        .map_err(|source| CustomError::CsvWrite {
            source,
            path: path.to_path_buf(),
        })
}

/// Write BED lines verbatim, one per line.
pub fn write_bed_lines<'a>(path: &Path, lines: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut wtr = create(path)?;
    for line in lines {
        writeln!(wtr, "{line}").map_err(write_err(path))?;
    }
    wtr.flush().map_err(write_err(path))
}

/// BED6 with the half-life (minutes) in the score column.
pub fn write_turnover_bed(path: &Path, records: &[TurnoverRecord]) -> Result<()> {
    let mut wtr = create(path)?;
    for record in records {
        let bed = &record.bed;
        writeln!(
            wtr,
            "{}\t{}\t{}\t{}\t{}\t{}",
            bed.chrom, bed.start, bed.end, bed.name, record.half_life, bed.strand
        )
        .map_err(write_err(path))?;
    }
    wtr.flush().map_err(write_err(path))
}

/// One single-block BED12 line per UTR, score column carrying the half-life.
pub fn write_bed12(path: &Path, models: &[UtrModel]) -> Result<()> {
    let mut wtr = create(path)?;
    for model in models {
        let bed = &model.turnover.bed;
        writeln!(
            wtr,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t0\t1\t{},\t0,",
            bed.chrom,
            bed.start,
            bed.end,
            bed.name,
            model.turnover.half_life,
            bed.strand,
            bed.start,
            bed.end,
            bed.len()
        )
        .map_err(write_err(path))?;
    }
    wtr.flush().map_err(write_err(path))
}

pub fn write_utr_fasta(path: &Path, models: &[UtrModel]) -> Result<()> {
    let f = File::create(path).map_err(write_err(path))?;
    let mut wtr = fasta::Writer::new(f);
    for model in models {
        wtr.write(model.name(), None, &model.sequence)
            .map_err(write_err(path))?;
    }
    wtr.flush().map_err(write_err(path))
}

pub fn write_expression_table(path: &Path, models: &[UtrModel]) -> Result<()> {
    let mut wtr = tsv_writer(path, true)?;
    let csv_err = |source| CustomError::CsvWrite {
        source,
        path: path.to_path_buf(),
    };
    wtr.write_record(EXPRESSION_HEADER).map_err(csv_err)?;
    for model in models {
        wtr.serialize((model.name(), model.expression))
            .map_err(csv_err)?;
    }
    wtr.flush().map_err(write_err(path))
}

pub fn write_vcf(path: &Path, models: &[UtrModel]) -> Result<()> {
    let mut wtr = create(path)?;
    writeln!(wtr, "##fileformat=VCFv4.1").map_err(write_err(path))?;
    writeln!(wtr, "##source=splash").map_err(write_err(path))?;
    writeln!(
        wtr,
        "##INFO=<ID=UTR,Number=1,Type=String,Description=\"UTR carrying the variant\">"
    )
    .map_err(write_err(path))?;
    writeln!(wtr, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").map_err(write_err(path))?;
    for model in models {
        for variant in &model.variants {
            writeln!(
                wtr,
                "{}\t{}\t.\t{}\t{}\t.\tPASS\tUTR={}",
                model.turnover.bed.chrom,
                variant.pos + 1,
                variant.reference as char,
                variant.alternate as char,
                model.name()
            )
            .map_err(write_err(path))?;
        }
    }
    wtr.flush().map_err(write_err(path))
}

pub fn write_utr_summary(path: &Path, summaries: &[UtrSummary]) -> Result<()> {
    let mut wtr = tsv_writer(path, true)?;
    let csv_err = |source| CustomError::CsvWrite {
        source,
        path: path.to_path_buf(),
    };
    wtr.write_record(SUMMARY_HEADER).map_err(csv_err)?;
    for s in summaries {
        wtr.serialize((
            s.chrom.as_str(),
            s.start,
            s.end,
            s.name.as_str(),
            s.length,
            s.strand.to_string(),
            s.half_life,
            s.labeled_fraction,
            s.reads,
            s.labeled_reads,
            s.tc_reads,
            s.t_count,
            s.conversions,
            s.conversion_rate(),
        ))
        .map_err(csv_err)?;
    }
    wtr.flush().map_err(write_err(path))
}

/// `samples.tsv`: BAM path, sample name, label type, time point. No header.
pub fn write_manifest(path: &Path, rows: &[ManifestRow]) -> Result<()> {
    let mut wtr = tsv_writer(path, false)?;
    for row in rows {
        wtr.serialize((
            row.bam.display().to_string(),
            row.sample_name.as_str(),
            row.label,
            row.time_point,
        ))
        .map_err(|source| CustomError::CsvWrite {
            source,
            path: path.to_path_buf(),
        })?;
    }
    wtr.flush().map_err(write_err(path))
}
