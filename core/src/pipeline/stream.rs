//! Line-oriented map and reduce filters, compatible with Hadoop-streaming style runners.

use super::shuffle::group_by_key;
use super::IndexJob;
use crate::lines::parse_document;
use crate::Result;
use std::io::{BufRead, Write};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    pub lines_in: usize,
    pub skipped: usize,
    pub lines_out: usize,
}

/// Read raw `doc_id_title<TAB>content` lines and write the job's map output.
pub fn run_map<J: IndexJob, R: BufRead, W: Write>(job: &J, input: R, mut output: W) -> Result<StreamReport> {
    let mut report = StreamReport::default();
    for line in input.lines() {
        let line = line?;
        report.lines_in += 1;
        let Some(doc) = parse_document(&line) else {
            tracing::debug!(line = report.lines_in, "skipping malformed document line");
            report.skipped += 1;
            continue;
        };
        for (key, value) in job.map(&doc) {
            writeln!(output, "{}", job.format_pair(&key, &value))?;
            report.lines_out += 1;
        }
    }
    output.flush()?;
    Ok(report)
}

/// Read map output in any order, group by key and write the job's reduce output.
pub fn run_reduce<J: IndexJob, R: BufRead, W: Write>(job: &J, input: R, mut output: W) -> Result<StreamReport> {
    let mut report = StreamReport::default();
    let mut pairs = Vec::new();
    for line in input.lines() {
        let line = line?;
        report.lines_in += 1;
        match job.parse_pair(&line) {
            Some(pair) => pairs.push(pair),
            None => {
                tracing::debug!(line = report.lines_in, "skipping malformed map line");
                report.skipped += 1;
            }
        }
    }
    for (key, values) in group_by_key(pairs) {
        for out in job.reduce(key, values) {
            writeln!(output, "{}", job.format_output(&out))?;
            report.lines_out += 1;
        }
    }
    output.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DocumentStatsJob, PostingsJob, VocabularyJob};

    fn map_then_reduce<J: IndexJob>(job: &J, raw: &str) -> String {
        let mut mapped = Vec::new();
        run_map(job, raw.as_bytes(), &mut mapped).unwrap();
        let mut reduced = Vec::new();
        run_reduce(job, mapped.as_slice(), &mut reduced).unwrap();
        String::from_utf8(reduced).unwrap()
    }

    const RAW: &str = "1_Cats\tThe cat sat\n2_Mats\tthe cat sat on the mat\nbroken line\n";

    #[test]
    fn stats_stream_broadcasts_average() {
        let out = map_then_reduce(&DocumentStatsJob, RAW);
        assert_eq!(out, "1\tCats\t3\t4.5\t2\n2\tMats\t6\t4.5\t2\n");
    }

    #[test]
    fn postings_stream_groups_by_term() {
        let out = map_then_reduce(&PostingsJob, RAW);
        assert!(out.lines().any(|l| l == "the\t1:1,2:2"));
        assert!(out.lines().any(|l| l == "mat\t2:1"));
    }

    #[test]
    fn vocabulary_stream_counts_documents() {
        let out = map_then_reduce(&VocabularyJob, RAW);
        assert!(out.lines().any(|l| l == "cat\t2"));
        assert!(out.lines().any(|l| l == "on\t1"));
    }

    #[test]
    fn malformed_lines_are_counted_not_fatal() {
        let mut sink = Vec::new();
        let report = run_reduce(&VocabularyJob, "ok\td1\nnot-a-pair\n".as_bytes(), &mut sink).unwrap();
        assert_eq!(report, StreamReport { lines_in: 2, skipped: 1, lines_out: 1 });
    }
}
