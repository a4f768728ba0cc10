//! simsort CLI
//!
//! `simsort <folder>` orders every .jpg/.jpeg/.png under `folder` by visual
//! similarity and renames them in place to 0001.ext, 0002.ext, ...
//!
//! Exit codes: 0 on success (even if some images were skipped), 1 when the
//! run fails, 2 on usage errors.

use clap::{Parser, ValueHint};
use simsort::{
    FeatureExtractor, ImageSorter, ResnetExtractor, SortConfig, SortError, SortOutcome, SortPhase,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "simsort",
    version,
    about = "Order a folder of images by visual similarity and rename them in place"
)]
struct Cli {
    /// Folder containing the images
    #[arg(value_hint = ValueHint::DirPath)]
    folder: PathBuf,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit with status 2 here
    let cli = Cli::parse();
    let result = run(&cli.folder, SortConfig::from_env());

    match &result {
        Ok(outcome) => {
            for path in outcome.final_paths() {
                println!("{}", path.display());
            }
            println!(
                "\nDone! {} images ordered by similarity in {}",
                outcome.records.len(),
                cli.folder.display()
            );
            println!("Images are now named 0001.ext, 0002.ext, ... in similarity order.");
        }
        Err(err) => {
            tracing::error!("{}", err);
            if let SortError::Rename(rename_err) = err {
                if let Some(report) = rename_err.report() {
                    eprintln!("\nThe folder was left partially renamed. Current state:");
                    eprint!("{}", report);
                }
            }
        }
    }

    ExitCode::from(exit_status(&result))
}

/// Skipped images do not fail the run; any fatal error does
fn exit_status(result: &Result<SortOutcome, SortError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn run(folder: &Path, config: SortConfig) -> Result<SortOutcome, SortError> {
    if !folder.is_dir() {
        return Err(SortError::InvalidFolder(folder.to_path_buf()));
    }

    tracing::info!("Loading ResNet50 model...");
    let extractor = ResnetExtractor::new(&config).map_err(SortError::Model)?;
    sort(&ImageSorter::new(extractor, config), folder)
}

fn sort<E: FeatureExtractor>(
    sorter: &ImageSorter<E>,
    folder: &Path,
) -> Result<SortOutcome, SortError> {
    let outcome = sorter.sort_folder(folder, |progress| match progress.phase {
        SortPhase::Extracting => match &progress.current_file {
            Some(file) => tracing::info!(
                "[{}/{}] Processing {}",
                progress.current,
                progress.total,
                file.strip_prefix(folder).unwrap_or(file.as_path()).display()
            ),
            None => tracing::info!(
                "[{}/{}] {}",
                progress.current,
                progress.total,
                progress.message
            ),
        },
        SortPhase::Done => {}
        _ => tracing::info!("{}", progress.message),
    })?;

    if !outcome.skipped.is_empty() {
        tracing::warn!(
            "{} of {} images were skipped",
            outcome.skipped.len(),
            outcome.discovered
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use image::{ImageBuffer, Rgb};
    use simsort::{FeatureVector, PreparedImage};
    use std::fs;
    use tempfile::tempdir;

    /// Average colour, so tests run without the model
    struct ColorExtractor;

    impl FeatureExtractor for ColorExtractor {
        fn name(&self) -> &str {
            "color"
        }

        fn extract(&self, image: &PreparedImage) -> Result<FeatureVector, String> {
            Ok(FeatureVector::new(image.mean_rgb().to_vec()))
        }
    }

    fn sorter() -> ImageSorter<ColorExtractor> {
        ImageSorter::new(ColorExtractor, SortConfig::default())
    }

    fn write_image(path: &Path, color: [u8; 3]) {
        ImageBuffer::from_pixel(8, 8, Rgb(color)).save(path).unwrap();
    }

    #[test]
    fn test_missing_folder_argument_is_a_usage_error() {
        let err = Cli::try_parse_from(["simsort"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_extra_argument_is_a_usage_error() {
        let err = Cli::try_parse_from(["simsort", "a", "b"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_folder_argument_is_parsed() {
        let cli = Cli::try_parse_from(["simsort", "photos"]).unwrap();
        assert_eq!(cli.folder, PathBuf::from("photos"));
    }

    #[test]
    fn test_skipped_images_still_exit_zero() {
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("a.png"), [10, 10, 10]);
        write_image(&dir.path().join("b.png"), [200, 200, 200]);
        fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let result = sort(&sorter(), dir.path());

        let outcome = result.as_ref().unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(exit_status(&result), 0);
    }

    #[test]
    fn test_all_images_failing_exits_one() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let result = sort(&sorter(), dir.path());

        assert!(matches!(result, Err(SortError::AllFailed(1))));
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn test_missing_folder_exits_one_before_loading_the_model() {
        let dir = tempdir().unwrap();

        let result = run(&dir.path().join("nope"), SortConfig::default());

        assert!(matches!(result, Err(SortError::InvalidFolder(_))));
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn test_empty_folder_exits_one() {
        let dir = tempdir().unwrap();

        let result = sort(&sorter(), dir.path());

        assert!(matches!(result, Err(SortError::NoImages(_))));
        assert_eq!(exit_status(&result), 1);
    }
}
