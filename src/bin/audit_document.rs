//! Repair and Audit a Document Model
//!
//! Loads a JSON document model, optionally repairs it from a glyph dump and
//! an alternate extraction, then audits it against a rendered Markdown file.
//!
//! Usage:
//!   cargo run --release --bin audit_document -- model.json rendered.md
//!   cargo run --release --bin audit_document -- model.json rendered.md \
//!       --glyphs glyphs.json --alternate alt.json --config repair.json \
//!       --pages 1,2 --worst 10 --output repaired.json

use pdf_spacefix::audit::{audit_document, audit_per_page, worst_pages};
use pdf_spacefix::cleanup::remove_date_only_text_in_pictures;
use pdf_spacefix::policy::{
    clean_document_table_cells, normalize_document_table_headers, CurrencyAligner,
};
use pdf_spacefix::spacing::InMemoryGlyphSource;
use pdf_spacefix::text::normalize_document_text;
use pdf_spacefix::{DocumentModel, Reconciler, RepairConfig, Result, SpacingRepairer};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::process;

struct AuditArgs {
    model: PathBuf,
    markdown: PathBuf,
    glyphs: Option<PathBuf>,
    alternate: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    pages: Option<BTreeSet<u32>>,
    worst: usize,
}

impl AuditArgs {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut positional = Vec::new();
        let mut glyphs = None;
        let mut alternate = None;
        let mut config = None;
        let mut output = None;
        let mut pages = None;
        let mut worst = 5;

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1);
            match args[i].as_str() {
                "--glyphs" => {
                    glyphs = value.map(PathBuf::from);
                    i += 1;
                },
                "--alternate" => {
                    alternate = value.map(PathBuf::from);
                    i += 1;
                },
                "--config" => {
                    config = value.map(PathBuf::from);
                    i += 1;
                },
                "--output" | "-o" => {
                    output = value.map(PathBuf::from);
                    i += 1;
                },
                "--pages" => {
                    pages = value.map(|v| {
                        v.split(',')
                            .filter_map(|p| p.trim().parse::<u32>().ok())
                            .collect::<BTreeSet<u32>>()
                    });
                    i += 1;
                },
                "--worst" => {
                    if let Some(n) = value.and_then(|v| v.parse().ok()) {
                        worst = n;
                    }
                    i += 1;
                },
                other => positional.push(PathBuf::from(other)),
            }
            i += 1;
        }

        if positional.len() != 2 {
            return None;
        }
        let markdown = positional.pop()?;
        let model = positional.pop()?;
        Some(Self {
            model,
            markdown,
            glyphs,
            alternate,
            config,
            output,
            pages,
            worst,
        })
    }
}

fn repair(doc: &mut DocumentModel, args: &AuditArgs, config: &RepairConfig) -> Result<()> {
    let removed = remove_date_only_text_in_pictures(doc, config.cleanup.picture_date_overlap);
    let normalized = normalize_document_text(doc).apply(doc);

    let mut spacing_fixes = 0;
    if let Some(path) = &args.glyphs {
        let source = InMemoryGlyphSource::from_json_str(&fs::read_to_string(path)?)?;
        let repairer = SpacingRepairer::new(config)?;
        let (edits, report) = repairer.repair(doc, &source, args.pages.as_ref());
        edits.apply(doc);
        spacing_fixes = report.total();
    }

    let mut merged = 0;
    if let Some(path) = &args.alternate {
        let alternate = DocumentModel::from_json_str(&fs::read_to_string(path)?)?;
        merged = Reconciler::new(config)?.reconcile(doc, &alternate).apply(doc);
    }

    let cleaned = clean_document_table_cells(doc).apply(doc);
    let headers = normalize_document_table_headers(doc).apply(doc);
    let currencies = CurrencyAligner::new(config.currency.clone())?
        .align_document(doc)
        .apply(doc);

    println!(
        "Repairs: removed={} normalized={} spacing={} merged={} cells={} headers={} currencies={}",
        removed, normalized, spacing_fixes, merged, cleaned, headers, currencies
    );
    Ok(())
}

fn run(args: &AuditArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => RepairConfig::load(path)?,
        None => RepairConfig::default(),
    };

    let mut doc = DocumentModel::from_json_str(&fs::read_to_string(&args.model)?)?;
    let markdown = fs::read_to_string(&args.markdown)?;

    repair(&mut doc, args, &config)?;

    let metrics = audit_document(&doc, &markdown);
    println!("Audit: {}", metrics);

    let pages = audit_per_page(&doc, &markdown);
    if !pages.is_empty() {
        println!("Worst pages:");
        for page in worst_pages(&pages, args.worst) {
            println!("  {}", page);
        }
    }

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let Some(args) = AuditArgs::from_args() else {
        eprintln!(
            "Usage: audit_document <model.json> <rendered.md> [--glyphs FILE] [--alternate FILE] \
             [--config FILE] [--pages 1,2] [--worst N] [--output FILE]"
        );
        process::exit(2);
    };

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
