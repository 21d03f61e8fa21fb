mod common;

use noodles::bam;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Output};

fn splash(subcommand: &str) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_splash"));
    command.arg("--quiet").arg(subcommand);
    command
}

fn run(command: &mut Command) -> Output {
    command.output().expect("failed to run splash")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "splash failed: stdout={} stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn feature_names(bed: &Path) -> Vec<String> {
    fs::read_to_string(bed)
        .unwrap()
        .lines()
        .map(|l| l.split('\t').nth(3).unwrap().to_string())
        .collect()
}

fn bam_record_count(path: &Path) -> usize {
    let mut reader = File::open(path).map(bam::io::Reader::new).unwrap();
    let header = reader.read_header().unwrap();
    reader.record_bufs(&header).map(|r| r.unwrap()).count()
}

#[test]
fn stage_commands_follow_naming_chain() {
    let dataset = common::create_dataset("stages").unwrap();
    let out = &dataset.output_dir;

    assert_success(&run(splash("preparebed")
        .arg("-b")
        .arg(&dataset.annotation)
        .arg("-l")
        .arg("50")
        .arg("-o")
        .arg(&out)));
    let filtered = out.join("utrs_original.bed");
    assert_eq!(feature_names(&filtered), common::KEPT_FEATURES);

    assert_success(&run(splash("turnover")
        .arg("-b")
        .arg(&filtered)
        .arg("--minhl")
        .arg("60")
        .arg("--maxhl")
        .arg("120")
        .arg("-o")
        .arg(&out)
        .arg("--seed")
        .arg("3")));
    let turnover = out.join("utrs_original_utrs.bed");
    for line in fs::read_to_string(&turnover).unwrap().lines() {
        let half_life: u32 = line.split('\t').nth(4).unwrap().parse().unwrap();
        assert!((60..=120).contains(&half_life), "{line}");
    }

    assert_success(&run(splash("utrs")
        .arg("-r")
        .arg(&dataset.reference)
        .arg("-b")
        .arg(&turnover)
        .arg("-l")
        .arg("50")
        .arg("-o")
        .arg(&out)
        .arg("--seed")
        .arg("3")));
    for ext in ["bed12", "fa", "eplv", "vcf"] {
        let path = out.join(format!("utrs_original_utrs.{ext}"));
        assert!(path.exists(), "missing {}", path.display());
    }
    assert_eq!(
        feature_names(&out.join("utrs_original_utrs.bed12")),
        common::KEPT_FEATURES
    );

    let samples = out.join("samples");
    assert_success(&run(splash("reads")
        .arg("-b")
        .arg(&turnover)
        .arg("--sample-name")
        .arg("pulse60")
        .arg("-l")
        .arg("50")
        .arg("-n")
        .arg("300")
        .arg("-p")
        .arg("60")
        .arg("-o")
        .arg(&samples)
        .arg("--seed")
        .arg("3")));
    assert_eq!(bam_record_count(&samples.join("pulse60_reads.bam")), 300);
    let summary = fs::read_to_string(samples.join("pulse60_utrsummary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 1 + common::KEPT_FEATURES.len());
    assert!(!samples.join("pulse60_reads_tmp.bed").exists());
    assert!(!samples.join("pulse60_reads_tmp.fa").exists());
}

#[test]
fn all_sweep_writes_manifest_and_cleans_up() {
    let dataset = common::create_dataset("sweep").unwrap();
    let out = &dataset.output_dir;
    assert_success(&run(splash("all")
        .arg("-r")
        .arg(&dataset.reference)
        .arg("-b")
        .arg(&dataset.annotation)
        .arg("-o")
        .arg(&out)
        .arg("-t")
        .arg("0,60,240")
        .arg("--replicates")
        .arg("2")
        .arg("--cov")
        .arg("4")
        .arg("-j")
        .arg("3")
        .arg("--seed")
        .arg("11")));

    let manifest = fs::read_to_string(out.join("samples.tsv")).unwrap();
    let rows: Vec<Vec<&str>> = manifest.lines().map(|l| l.split('\t').collect()).collect();
    let expected = [
        ("sample_1_0min_rep1", "0"),
        ("sample_2_0min_rep2", "0"),
        ("sample_3_60min_rep1", "60"),
        ("sample_4_60min_rep2", "60"),
        ("sample_5_240min_rep1", "240"),
        ("sample_6_240min_rep2", "240"),
    ];
    assert_eq!(rows.len(), expected.len());
    for (row, (name, time_point)) in rows.iter().zip(expected) {
        assert_eq!(row[1], name);
        assert_eq!(row[2], "pulse");
        assert_eq!(row[3], time_point);
        assert!(Path::new(row[0]).exists(), "missing {}", row[0]);
        assert!(out.join(format!("{name}_utrsummary.csv")).exists());
    }

    for entry in fs::read_dir(out).unwrap() {
        let name = entry.unwrap().file_name();
        assert!(
            !name.to_string_lossy().contains("_tmp"),
            "leftover temporary file {name:?}"
        );
    }
    assert!(out.join("utrs_original_utrs.bed12").exists());
    assert!(out.join("simulation.json").exists());
}

#[test]
fn seeded_runs_are_reproducible() {
    let dataset = common::create_dataset("seeded").unwrap();
    let mut summaries = Vec::new();
    for label in ["a", "b"] {
        let out = dataset.base_dir.join(label);
        assert_success(&run(splash("all")
            .arg("-r")
            .arg(&dataset.reference)
            .arg("-b")
            .arg(&dataset.annotation)
            .arg("-o")
            .arg(&out)
            .arg("-t")
            .arg("30")
            .arg("--replicates")
            .arg("1")
            .arg("--cov")
            .arg("3")
            .arg("-s")
            .arg("0.01")
            .arg("-j")
            .arg("1")
            .arg("--seed")
            .arg("42")));
        summaries.push(
            [
                "utrs_original_utrs.bed",
                "utrs_original_utrs.fa",
                "utrs_original_utrs.eplv",
                "utrs_original_utrs.vcf",
                "sample_1_30min_rep1_utrsummary.csv",
            ]
            .map(|f| fs::read(out.join(f)).unwrap()),
        );
    }
    assert_eq!(summaries[0], summaries[1]);
}

#[test]
fn configuration_errors_exit_non_zero() {
    let dataset = common::create_dataset("config").unwrap();
    let out = &dataset.output_dir;

    let inverted = run(splash("turnover")
        .arg("-b")
        .arg(&dataset.annotation)
        .arg("--minhl")
        .arg("700")
        .arg("--maxhl")
        .arg("30")
        .arg("-o")
        .arg(&out));
    assert!(!inverted.status.success());

    let no_replicates = run(splash("all")
        .arg("-r")
        .arg(&dataset.reference)
        .arg("-b")
        .arg(&dataset.annotation)
        .arg("-o")
        .arg(&out)
        .arg("--replicates")
        .arg("0"));
    assert!(!no_replicates.status.success());

    let bad_rate = run(splash("utrs")
        .arg("-r")
        .arg(&dataset.reference)
        .arg("-b")
        .arg(&dataset.annotation)
        .arg("-l")
        .arg("50")
        .arg("-s")
        .arg("1.5")
        .arg("-o")
        .arg(&out));
    assert!(!bad_rate.status.success());
    assert!(!out.exists(), "configuration errors must not create outputs");
}

#[test]
fn out_of_bounds_feature_fails_utrs() {
    let dataset = common::create_dataset("bounds").unwrap();
    let bed = dataset.base_dir.join("past_end_utrs.bed");
    fs::write(&bed, "chr2\t1400\t1600\tpast\t90\t+\n").unwrap();
    let output = run(splash("utrs")
        .arg("-r")
        .arg(&dataset.reference)
        .arg("-b")
        .arg(&bed)
        .arg("-l")
        .arg("50")
        .arg("-o")
        .arg(&dataset.output_dir));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chr2:1400-1600"), "{stderr}");
}

#[test]
fn conversion_rate_reports_region_counts() {
    let dataset = common::create_dataset("conversionrate").unwrap();
    let bam_path = dataset.base_dir.join("mapped.bam");
    common::write_mapped_bam(&bam_path, 101, 200).unwrap();

    let output = run(splash("util.conversionrate")
        .arg(&bam_path)
        .arg("-r")
        .arg(&dataset.reference)
        .arg("--region")
        .arg("chr1:1-1,000"));
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let fields: Vec<&str> = stdout.trim_end().split('\t').collect();
    let t = common::t_count(101, 200);
    assert!(t > 0);
    assert_eq!(fields[0], bam_path.display().to_string());
    assert_eq!(fields[1], "chr1:1-1000");
    assert_eq!(fields[2], "+");
    assert_eq!(fields[3], (2 * t).to_string());
    assert_eq!(fields[4], t.to_string());
    assert_eq!(fields[5], "0.5");
}
