use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{Layer, filter::LevelFilter, fmt, prelude::*, registry::LookupSpan};

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Plain-text layer for `--log-file`: thread ids and targets, no colour codes.
fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(stderr_layer);

    match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            subscriber.with(file_layer(file)).init();
        }
        None => subscriber.init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforce::core::forcefield::definition::SystemDefinition;
    use cellforce::engine::config::KernelConfigBuilder;
    use cellforce::engine::process_pool::ProcessPool;
    use cellforce::engine::progress::ProgressReporter;
    use cellforce::workflows::evaluate;
    use serial_test::serial;
    use std::path::Path;

    const ARGON_PAIR: &str = r#"
        [box]
        lengths = [20.0, 20.0, 20.0]

        [pair-potential]
        range = 6.0

        [[atom-types]]
        name = "AR"
        short-range = { form = "lennard-jones", epsilon = 0.99, sigma = 3.4 }

        [[species]]
        name = "argon"
        atoms = [{ name = "AR", type = "AR" }]

        [[molecules]]
        species = "argon"
        positions = [[2.0, 2.0, 2.0]]

        [[molecules]]
        species = "argon"
        positions = [[5.8, 2.0, 2.0]]
    "#;

    /// Runs one evaluation with a file layer behind `filter` and returns the log text.
    fn evaluate_with_file_log(path: &Path, filter: LevelFilter) -> String {
        let definition: SystemDefinition = toml::from_str(ARGON_PAIR).unwrap();
        let mut system = definition.build().unwrap();
        let config = KernelConfigBuilder::new().cutoff(6.0).build().unwrap();

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(file_layer(File::create(path).unwrap()));
        tracing::subscriber::with_default(subscriber, || {
            evaluate::run(
                &mut system.configuration,
                &system.potential_map,
                &config,
                &ProcessPool::serial(),
                &ProgressReporter::new(),
            )
            .unwrap();
        });
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn verbosity_maps_to_level_filters() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
    }

    #[test]
    #[serial]
    fn file_layer_records_workflow_events_inside_their_span() {
        let temp_dir = tempfile::tempdir().unwrap();
        let content =
            evaluate_with_file_log(&temp_dir.path().join("cellforce.log"), level_filter(1, false));

        assert!(content.contains("Starting energy evaluation."));
        assert!(content.contains("Evaluation complete."));
        assert!(content.contains("evaluate_workflow"));
        assert!(content.contains("n_molecules=2"));
        assert!(content.contains("ThreadId"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    #[serial]
    fn default_verbosity_keeps_workflow_progress_out_of_the_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let content =
            evaluate_with_file_log(&temp_dir.path().join("quiet.log"), level_filter(0, false));

        assert!(!content.contains("Starting energy evaluation."));
        assert!(!content.contains("Evaluation complete."));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
