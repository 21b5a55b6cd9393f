// crates/fastpred-cli/src/io/report.rs

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use clap::ValueEnum;
use fastpred_core::targets::{InfoTable, TargetHit};
use fastpred_core::Screening;
use serde_json::{json, Map, Value};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human readable, one block per query molecule
    Txt,
    /// Tab separated rows: query, reference, target, score
    Tsv,
    /// One JSON object per query molecule (JSONL)
    Json,
}

const TSV_HEADER: [&str; 4] = ["query_name", "database_molecule_id", "target_id", "score"];

pub struct ReportWriter {
    out: Box<dyn Write>,
    format: Format,
    info: Option<InfoTable>,
    header_done: bool,
}

impl ReportWriter {
    /// Report to `path`, or stdout when `None`. Rows of `info` are appended to
    /// every hit on the target they describe.
    pub fn open(path: Option<&str>, format: Format, info: Option<InfoTable>) -> anyhow::Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(p) => Box::new(BufWriter::new(
                File::create(p).with_context(|| format!("create report {p}"))?,
            )),
            None => Box::new(BufWriter::new(std::io::stdout())),
        };
        Ok(Self::to_writer(out, format, info))
    }

    pub fn to_writer(out: Box<dyn Write>, format: Format, info: Option<InfoTable>) -> Self {
        Self { out, format, info, header_done: false }
    }

    // One cell list per output row of a hit: a target with several info rows
    // is reported once per row; a target without any gets empty cells.
    fn info_cells(&self, target_id: &str) -> Vec<Vec<String>> {
        match &self.info {
            None => vec![Vec::new()],
            Some(info) => match info.rows_for(target_id) {
                [] => vec![vec![String::new(); info.columns().len()]],
                rows => rows.to_vec(),
            },
        }
    }

    fn target_info_json(&self, hits: &[TargetHit]) -> Option<Value> {
        let info = self.info.as_ref()?;
        let mut out = Map::new();
        for h in hits {
            if out.contains_key(&h.target_id) {
                continue;
            }
            let rows: Vec<Value> = info
                .rows_for(&h.target_id)
                .iter()
                .map(|row| {
                    let obj: Map<String, Value> = info
                        .columns()
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().map(Value::String))
                        .collect();
                    Value::Object(obj)
                })
                .collect();
            out.insert(h.target_id.clone(), Value::Array(rows));
        }
        Some(Value::Object(out))
    }

    pub fn write_molecule(
        &mut self,
        query: &str,
        screening: &Screening,
        hits: &[TargetHit],
    ) -> anyhow::Result<()> {
        match self.format {
            Format::Txt => self.write_txt(query, hits),
            Format::Tsv => self.write_tsv(query, hits),
            Format::Json => {
                let mut line = json!({
                    "query": query,
                    "iterations": screening.iterations,
                    "discarded": screening.discarded,
                    "removed": screening.removed,
                    "result": &screening.result,
                    "targets": hits,
                });
                if let Some(info) = self.target_info_json(hits) {
                    line["target_info"] = info;
                }
                writeln!(self.out, "{line}")?;
                Ok(())
            }
        }
    }

    fn write_txt(&mut self, query: &str, hits: &[TargetHit]) -> anyhow::Result<()> {
        writeln!(self.out, "Compound : >{query}<")?;
        if hits.is_empty() {
            writeln!(self.out, "{:15}No hit.", "")?;
        }
        for (i, h) in hits.iter().enumerate() {
            for cells in self.info_cells(&h.target_id) {
                let extra = cells.join(" ");
                let extra = extra.trim_end();
                let sep = if extra.is_empty() { "" } else { " " };
                writeln!(
                    self.out,
                    "{:15}{:<10} {:<14} {:>7.3}  {}{sep}{extra}",
                    "",
                    i + 1,
                    h.reference_id,
                    h.score,
                    h.target_id
                )?;
            }
        }
        Ok(())
    }

    fn write_tsv(&mut self, query: &str, hits: &[TargetHit]) -> anyhow::Result<()> {
        if !self.header_done {
            let mut header: Vec<&str> = TSV_HEADER.to_vec();
            if let Some(info) = &self.info {
                header.extend(info.columns().iter().map(String::as_str));
            }
            writeln!(self.out, "{}", header.join("\t"))?;
            self.header_done = true;
        }
        for h in hits {
            for cells in self.info_cells(&h.target_id) {
                let mut row = format!("{query}\t{}\t{}\t{}", h.reference_id, h.target_id, h.score);
                for c in &cells {
                    row.push('\t');
                    row.push_str(c);
                }
                writeln!(self.out, "{row}")?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> anyhow::Result<()> {
        self.out.flush().context("flush report")?;
        Ok(())
    }
}
