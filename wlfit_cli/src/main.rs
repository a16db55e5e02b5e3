//! wlfit CLI - fits the Winston-Lutz beam model to a scanned film.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::DVec2;
use serde::Serialize;
use wlfit::{
    BeamGeometry, FilmImage, FilmOrientation, FitControls, FitProgress, FusionConfig,
    FusionOutcome, ProgressCallback, SimilarityMeasure, Termination, fuse,
};

#[derive(Debug, Parser)]
#[command(name = "wlfit")]
#[command(about = "Align the collimator, MLC and ball model to a Winston-Lutz film scan")]
#[command(version)]
struct Cli {
    /// Path to the scanned film image.
    image: PathBuf,

    /// Scan resolution in dots per inch.
    #[arg(long)]
    dpi: f64,

    /// Approximate ball center, image column in pixels.
    #[arg(long)]
    ball_x: f64,

    /// Approximate ball center, image row in pixels.
    #[arg(long)]
    ball_y: f64,

    /// Direction of the gantry head on the film.
    #[arg(long, value_enum, default_value_t = OrientationArg::Up)]
    orientation: OrientationArg,

    /// Mirror the scan left-to-right before fitting.
    #[arg(long)]
    flip_horizontal: bool,

    /// Mirror the scan top-to-bottom before fitting.
    #[arg(long)]
    flip_vertical: bool,

    /// Fusion configuration file (.yaml, .yml or .json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Similarity measure, overrides the configuration file.
    #[arg(long, value_enum)]
    measure: Option<MeasureArg>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrientationArg {
    Up,
    Right,
    Down,
    Left,
}

impl From<OrientationArg> for FilmOrientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::Up => FilmOrientation::Up,
            OrientationArg::Right => FilmOrientation::Right,
            OrientationArg::Down => FilmOrientation::Down,
            OrientationArg::Left => FilmOrientation::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MeasureArg {
    MutualInformation,
    Correlation,
    PatternIntensity,
}

impl From<MeasureArg> for SimilarityMeasure {
    fn from(value: MeasureArg) -> Self {
        match value {
            MeasureArg::MutualInformation => SimilarityMeasure::MutualInformation,
            MeasureArg::Correlation => SimilarityMeasure::NormalizedCrossCorrelation,
            MeasureArg::PatternIntensity => SimilarityMeasure::PatternIntensity,
        }
    }
}

/// Printed to stdout on success.
#[derive(Debug, Serialize)]
struct Report {
    image: PathBuf,
    dpi: f64,
    geometry: BeamGeometry,
    cost: f64,
    evaluations: usize,
    termination: Termination,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::log_setup::setup_logging(&cli.log_level);

    let outcome = run(&cli)?;
    let report = Report {
        image: cli.image.clone(),
        dpi: cli.dpi,
        geometry: outcome.geometry,
        cost: outcome.cost,
        evaluations: outcome.evaluations,
        termination: outcome.termination,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize result")?
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<FusionOutcome> {
    let config = fusion_config(cli)?;

    let image = image::open(&cli.image)
        .with_context(|| format!("Failed to open image '{}'", cli.image.display()))?;
    let film = FilmImage::from_dynamic_image(&image, cli.dpi)
        .context("Invalid film image")?
        .flipped(cli.flip_horizontal, cli.flip_vertical);
    tracing::info!(
        path = %cli.image.display(),
        width = film.width(),
        height = film.height(),
        dpi = film.dpi(),
        "Film loaded"
    );

    let initial = initial_geometry(cli);
    let controls = FitControls {
        progress: ProgressCallback::new(Arc::new(|p: FitProgress| {
            tracing::info!(percent = (p.fraction * 100.0).round(), "Searching");
        })),
        ..FitControls::default()
    };

    let outcome = fuse(&film, &initial, &config, &controls).context("Fusion failed")?;
    tracing::info!(geometry = %outcome.geometry, "Fit complete");
    Ok(outcome)
}

fn initial_geometry(cli: &Cli) -> BeamGeometry {
    BeamGeometry::new(
        DVec2::new(cli.ball_x, cli.ball_y),
        cli.orientation.into(),
        cli.dpi,
    )
}

fn fusion_config(cli: &Cli) -> Result<FusionConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FusionConfig::default(),
    };
    if let Some(measure) = cli.measure {
        config.measure = measure.into();
    }
    config.validate().context("Invalid fusion configuration")?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<FusionConfig> {
    let name = path.to_string_lossy();
    let format = common::FileFormat::from_file_name(&name)
        .with_context(|| format!("Unsupported config file '{name}'"))?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{name}'"))?;
    common::deserialize(&text, format).with_context(|| format!("Failed to parse config '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_arguments() {
        let cli = Cli::try_parse_from([
            "wlfit", "film.png", "--dpi", "150", "--ball-x", "412.5", "--ball-y", "388",
        ])
        .unwrap();
        assert_eq!(cli.image, PathBuf::from("film.png"));
        assert_eq!(cli.dpi, 150.0);
        assert_eq!(cli.orientation, OrientationArg::Up);
        assert!(!cli.flip_horizontal && !cli.flip_vertical);
        assert!(cli.config.is_none());
        assert_eq!(cli.log_level, "info");

        let geometry = initial_geometry(&cli);
        assert_eq!(geometry.ball_center, DVec2::new(412.5, 388.0));
        assert_eq!(geometry.pixel_size, wlfit::pixel_size_from_dpi(150.0));
    }

    #[test]
    fn parses_all_options() {
        let cli = Cli::try_parse_from([
            "wlfit",
            "scan.tif",
            "--dpi",
            "300",
            "--ball-x",
            "1",
            "--ball-y",
            "2",
            "--orientation",
            "left",
            "--flip-horizontal",
            "--flip-vertical",
            "--config",
            "fit.yaml",
            "--measure",
            "pattern-intensity",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.orientation, OrientationArg::Left);
        assert!(cli.flip_horizontal && cli.flip_vertical);
        assert_eq!(cli.config, Some(PathBuf::from("fit.yaml")));
        assert_eq!(cli.measure, Some(MeasureArg::PatternIntensity));
        assert_eq!(
            initial_geometry(&cli).film_orientation,
            FilmOrientation::Left
        );
    }

    #[test]
    fn rejects_missing_ball_position() {
        assert!(Cli::try_parse_from(["wlfit", "film.png", "--dpi", "150"]).is_err());
        assert!(
            Cli::try_parse_from([
                "wlfit", "film.png", "--dpi", "150", "--ball-x", "1", "--ball-y", "2",
                "--orientation", "diagonal",
            ])
            .is_err()
        );
    }

    #[test]
    fn measure_flag_overrides_default() {
        let cli = Cli::try_parse_from([
            "wlfit", "f.png", "--dpi", "150", "--ball-x", "1", "--ball-y", "2", "--measure",
            "correlation",
        ])
        .unwrap();
        let config = fusion_config(&cli).unwrap();
        assert_eq!(config.measure, SimilarityMeasure::NormalizedCrossCorrelation);
        assert_eq!(config.levels, FusionConfig::default().levels);
    }

    #[test]
    fn load_config_rejects_unknown_extension() {
        let err = load_config(Path::new("settings.toml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file"));
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("wlfit-cli-{}.yaml", std::process::id()));
        std::fs::write(&path, "levels: 1000\n").unwrap();
        let config_arg = path.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "wlfit", "f.png", "--dpi", "150", "--ball-x", "1", "--ball-y", "2", "--config",
            config_arg.as_str(),
        ])
        .unwrap();

        let result = fusion_config(&cli);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("levels"), "{err:#}");
    }
}
