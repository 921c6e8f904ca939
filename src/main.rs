use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use metadata_remapper::backup::{Outcome, run_transaction};
use metadata_remapper::cli::{Cli, USAGE};
use metadata_remapper::config::RemapConfig;
use metadata_remapper::logging::init_logging;
use metadata_remapper::mapping::MappingTable;
use metadata_remapper::metadata::MetadataRemapper;
use metadata_remapper::walk::ContainerWalker;
use tracing::info;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.verbose)?;

    let config = RemapConfig::from_cli(&cli)?;
    let mapping = MappingTable::load(&config.mapping_path)?;
    let resolver = mapping.resolver(config.mode.namespace())?;
    let remapper = MetadataRemapper::new(resolver, config.mode, config.strategy);
    info!(
        mapping = %config.mapping_path.display(),
        classes = mapping.len(),
        namespace = resolver.source_namespace(),
        strategy = ?config.strategy,
        "loaded mappings"
    );

    let walker = ContainerWalker::new(&remapper);
    let outcome = run_transaction(&config.target, |target| {
        let report = walker.visit(target)?;
        info!(
            classes = report.classes_seen,
            remapped = report.classes_rewritten,
            archives = report.archives_seen,
            rebuilt = report.archives_rewritten,
            "walk finished"
        );
        Ok(report.changed())
    })?;

    if outcome == Outcome::Restored {
        info!(target = %config.target.display(), "target left unchanged");
    }
    Ok(())
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            println!("{USAGE}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
