use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;

use crate::circle::types::PipelineItem;
use crate::error::Result;
use crate::hierarchy::PipelineReport;
use crate::scanner::{DocumentScan, OrbVersion};

// Styling helpers

fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

// Banner

pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🛰  circletrace"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CircleCI build hierarchy and telemetry")
    );
}

// Pipeline listing

pub fn print_pipelines(pipelines: &[PipelineItem]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Number", "State", "Branch", "Revision", "Actor", "Created",
        ]);

    for pipeline in pipelines {
        let (branch, revision) = pipeline
            .vcs
            .as_ref()
            .map(|vcs| {
                let short = vcs.revision.chars().take(9).collect::<String>();
                (vcs.branch.clone(), short)
            })
            .unwrap_or_default();
        let created = pipeline
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        table.add_row(vec![
            pipeline.number.to_string(),
            pipeline.state.clone(),
            branch,
            revision,
            pipeline.trigger.actor.login.clone(),
            created,
        ]);
    }

    println!("{table}");
}

// Configuration scan rendering

pub fn print_document_scan(scan: &DocumentScan) {
    println!("{}", magenta_bold("jobs"));
    for (name, env) in &scan.jobs {
        let mut facts = Vec::new();
        if let Some(machine) = &env.machine {
            facts.push(format!("machine={machine}"));
        }
        if let Some(image) = &env.image {
            facts.push(format!("image={image}"));
        }
        if let Some(resource_class) = &env.resource_class {
            facts.push(format!("resource_class={resource_class}"));
        }
        println!("  {} {}", name, dim(facts.join(" ")));
    }

    println!("{}", magenta_bold("parameters"));
    for (name, parameter) in &scan.parameters {
        let kind = parameter.kind.as_deref().unwrap_or("-");
        let default = parameter.default.as_deref().unwrap_or("-");
        let mut line = format!("  {name} type={kind} default={default}");
        if !parameter.enum_values.is_empty() {
            line.push_str(&format!(" enum=[{}]", parameter.enum_values.join(", ")));
        }
        println!("{line}");
    }

    println!("{}", magenta_bold("orbs"));
    for orb in &scan.orbs {
        match &orb.version {
            OrbVersion::Pinned(version) => println!("  {}: {version}", orb.name),
            OrbVersion::Embedded => println!("  {}: {}", orb.name, dim("embedded")),
        }
    }
}

pub fn scan_summary_line(report: &PipelineReport) -> String {
    let steps: usize = report
        .workflows
        .iter()
        .flat_map(|w| &w.jobs)
        .map(|j| j.steps.len())
        .sum();
    format!(
        "{} pipeline {} ({}): {} workflows, {} steps",
        bright_green("✓"),
        report.number,
        report.id,
        report.workflows.len(),
        steps,
    )
}

// Progress tracking

pub struct ScanProgress {
    pb: ProgressBar,
}

impl ScanProgress {
    pub fn start() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap(),
        );
        pb.set_message(bright_yellow("Scanning").to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { pb }
    }

    pub fn note(&self, message: impl Into<String>) {
        self.pb.set_message(bright_yellow(message.into()).to_string());
    }

    /// Prints a line above the spinner without disturbing it.
    pub fn log(&self, line: String) {
        self.pb.println(line);
    }

    pub fn finish(self, summary: impl Into<String>) {
        self.pb
            .finish_with_message(bright_green(summary.into()).to_string());
        eprintln!();
    }
}

// Result persistence

/// Appends JSON-encoded report arrays to a flat file as bracket-stripped
/// fragments, so consecutive appends concatenate into one conceptually larger
/// array. The file is not valid JSON until [`FragmentWriter::finish`] adds the
/// single closing bracket.
pub struct FragmentWriter {
    path: PathBuf,
    any_written: bool,
}

impl FragmentWriter {
    /// Creates (truncating) the output file and writes the array opening.
    pub fn create(path: &Path) -> Result<Self> {
        let mut file = File::create(path)?;
        file.write_all(b"[")?;
        Ok(Self {
            path: path.to_path_buf(),
            any_written: false,
        })
    }

    /// Appends one report array with its surrounding brackets stripped.
    ///
    /// Assumes the single-line encoding `serde_json::to_string` produces;
    /// pretty-printed fragments would break the concatenation.
    pub fn append_fragment<T: Serialize>(&mut self, reports: &[T]) -> Result<()> {
        let encoded = serde_json::to_string(reports)?;
        let inner = &encoded[1..encoded.len() - 1];
        if inner.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        if self.any_written {
            file.write_all(b",")?;
        }
        writeln!(file, "{inner}")?;
        self.any_written = true;
        Ok(())
    }

    /// Writes the single closing bracket that turns the accumulated fragments
    /// into one JSON array.
    pub fn finish(self) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(b"]")?;
        Ok(())
    }
}
