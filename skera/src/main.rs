//! binary subset tool
//!
//! Takes raw `glyf`/`loca` and `fvar` tables plus a description of the desired
//! subset, and writes the subset tables to an output directory.

use std::path::{Path, PathBuf};

use clap::Parser;
use skera::{
    parse_instancing_spec, parse_tag_list, populate_gids, subset_tables, FontTables,
    MutableGlyphTable, Plan, SubsetFlags, FVAR, GLYF, LOCA,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The input glyf table.
    #[arg(long, requires = "loca")]
    glyf: Option<PathBuf>,

    /// The input loca table.
    #[arg(long, requires = "glyf")]
    loca: Option<PathBuf>,

    /// The input loca table uses 32-bit offsets
    #[arg(long)]
    long_loca: bool,

    /// The input fvar table.
    #[arg(long)]
    fvar: Option<PathBuf>,

    /// List of glyph ids
    #[arg(short, long, default_value = "*")]
    gids: String,

    /// Pin or restrict axes, for example "wght=400,wdth=75:100" or "*=drop"
    #[arg(long)]
    variations: Option<String>,

    /// Tables to leave out of the output
    #[arg(long)]
    drop_tables: Option<String>,

    /// The directory the subset tables are written to
    #[arg(short, long)]
    output_dir: PathBuf,

    /// drop hints
    #[arg(long)]
    no_hinting: bool,

    /// If set don't renumber glyph ids in the subset.
    #[arg(long)]
    retain_gids: bool,

    /// Set the overlaps flag on each glyph
    #[arg(long)]
    set_overlaps_flag: bool,

    /// Keep the outline of .notdef glyph
    #[arg(long)]
    notdef_outline: bool,

    /// Always write 32-bit loca offsets
    #[arg(long)]
    force_long_loca: bool,

    /// Re-encode every glyph, packing point data and recomputing bounding boxes
    #[arg(long)]
    reencode: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let subset_flags = parse_subset_flags(args);
    let gids = populate_gids(&args.gids)?;
    let variations = args
        .variations
        .as_deref()
        .map(parse_instancing_spec)
        .transpose()?;
    let drop_tables = parse_tag_list(args.drop_tables.as_deref().unwrap_or_default())?;

    let glyf = read_optional(args.glyf.as_deref())?;
    let loca = read_optional(args.loca.as_deref())?;
    let fvar = read_optional(args.fvar.as_deref())?;
    let font = FontTables::from_raw(
        glyf.as_deref(),
        loca.as_deref(),
        args.long_loca,
        fvar.as_deref(),
    )?;

    let plan = Plan::new(&gids, subset_flags, variations.as_ref(), &font)?;
    let mut output = subset_tables(&font, &plan)?;

    if args.reencode {
        if let Some(source) = font.glyf.as_ref() {
            let mut table = MutableGlyphTable::subset(source, &plan)?;
            table.reencode(args.no_hinting)?;
            output.glyf = Some(table.compile(subset_flags)?);
        }
    }

    std::fs::create_dir_all(&args.output_dir)?;
    if let Some(compiled) = output.glyf {
        if !drop_tables.contains(&GLYF) {
            write_table(&args.output_dir, "glyf", &compiled.glyf)?;
            write_table(&args.output_dir, "loca", &compiled.loca)?;
            log::info!(
                "{LOCA} uses {} offsets",
                if compiled.loca_format == 0 {
                    "short"
                } else {
                    "long"
                }
            );
        }
    }
    if let Some(fvar) = output.fvar {
        if !drop_tables.contains(&FVAR) {
            write_table(&args.output_dir, "fvar", &fvar)?;
        }
    }
    let name_ids: Vec<_> = plan.name_ids().iter().map(|id| id.to_string()).collect();
    if !name_ids.is_empty() {
        println!("retained name ids: {}", name_ids.join(","));
    }
    Ok(())
}

fn read_optional(path: Option<&Path>) -> std::io::Result<Option<Vec<u8>>> {
    path.map(std::fs::read).transpose()
}

fn write_table(dir: &Path, name: &str, data: &[u8]) -> std::io::Result<()> {
    let path = dir.join(format!("{name}.bin"));
    log::debug!("writing {} bytes to {}", data.len(), path.display());
    std::fs::write(path, data)
}

fn parse_subset_flags(args: &Args) -> SubsetFlags {
    let mut flags = SubsetFlags::default();
    if args.no_hinting {
        flags |= SubsetFlags::SUBSET_FLAGS_NO_HINTING;
    }

    if args.retain_gids {
        flags |= SubsetFlags::SUBSET_FLAGS_RETAIN_GIDS;
    }

    if args.set_overlaps_flag {
        flags |= SubsetFlags::SUBSET_FLAGS_SET_OVERLAPS_FLAG;
    }

    if args.notdef_outline {
        flags |= SubsetFlags::SUBSET_FLAGS_NOTDEF_OUTLINE;
    }

    if args.force_long_loca {
        flags |= SubsetFlags::SUBSET_FLAGS_FORCE_LONG_LOCA;
    }
    flags
}
