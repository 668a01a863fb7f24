#[macro_use]
extern crate log;

use std::{collections::BTreeSet, error::Error, sync::Arc, time::Instant};

use common::{kendall_test, pearson_test, SampleTable};
use density_plot::{
    plot_fits, plot_observed_vs_predicted, plot_raster, BandOptions, FitPanel, PanelLayout,
};
use dialoguer::{theme::ColorfulTheme, Select};
use lin_reg::{FittedModel, OrdinaryLeastSquares};
use resampling::{
    cross_validate, CvParams, FailurePolicy, FoldPartition, Parallelism, RepeatedCrossValidation,
};
use spatial::{
    apply_mask, mask_by_category, predict_raster_by_name, read_ascii_grid_file,
    write_ascii_grid_file, RasterGrid,
};

type DynResult<T> = Result<T, Box<dyn Error>>;

const SAMPLE_PATH: &str = "data/deer_density.csv";
const GRID_DIR: &str = "data/grids";
const LAND_COVER_GRID: &str = "data/grids/LandCover.asc";
// forest classes of the land-cover legend, where deer density is modelled
const KEEP_LAND_COVER: [i64; 3] = [4, 5, 6];

const RESPONSE: &str = "logDD";
const COVARIATES: [&str; 5] = ["DistanceLC", "NewDBH", "NewBA", "LCProp", "SnowDepth"];

const NUM_FOLDS: usize = 5;
const REPETITIONS: usize = 100;
const CONFIDENCE_LEVEL: f64 = 0.95;
const IMG_DIMS: (u32, u32) = (1920, 1080);

fn main() -> DynResult<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let t0 = Instant::now();
    let table = SampleTable::from_path(SAMPLE_PATH)?;
    info!(
        "loaded {} rows with columns {:?} in {}ms",
        table.n_rows(),
        table.column_names(),
        t0.elapsed().as_millis()
    );

    let steps = vec![
        "Correlations",
        "Univariate models",
        "Full model",
        "Repeated cross-validation",
        "Spatial prediction",
    ];
    let e = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select analysis step")
        .items(&steps)
        .default(0)
        .interact()?;
    match e {
        0 => correlations(&table),
        1 => univariate_models(&table),
        2 => full_model(&table).map(|_| ()),
        3 => cross_validation(table),
        4 => spatial_prediction(&table),
        _ => unreachable!(),
    }
}

fn correlations(table: &SampleTable) -> DynResult<()> {
    let y = table.column(RESPONSE)?;
    println!("{:<12} {:>8} {:>10} {:>8} {:>10}", "covariate", "r", "p", "tau", "p");
    for name in COVARIATES {
        let x = table.column(name)?;
        let p = pearson_test(x, y)?;
        let k = kendall_test(x, y)?;
        println!(
            "{:<12} {:>8.3} {:>10.4} {:>8.3} {:>10.4}",
            name, p.estimate, p.p_value, k.estimate, k.p_value
        );
    }

    Ok(())
}

fn univariate_models(table: &SampleTable) -> DynResult<()> {
    let regressor = OrdinaryLeastSquares::default();
    let options = BandOptions {
        draw_bands: true,
        confidence_level: CONFIDENCE_LEVEL,
        segment_count: 50,
    };
    let y = table.column(RESPONSE)?;

    let mut panels = Vec::with_capacity(COVARIATES.len());
    for name in COVARIATES {
        let model = table.fit(&regressor, RESPONSE, &[name])?;
        println!("{}", model);
        panels.push(FitPanel::new(&model, table.column(name)?, y, &options)?);
    }
    plot_fits(
        &panels,
        &PanelLayout::for_panels(panels.len()),
        "img/univariate_models.png",
        IMG_DIMS,
    )?;

    Ok(())
}

fn full_model(table: &SampleTable) -> DynResult<FittedModel> {
    let model = table.fit(&OrdinaryLeastSquares::default(), RESPONSE, &COVARIATES)?;
    println!("{}", model);

    Ok(model)
}

fn cross_validation(table: SampleTable) -> DynResult<()> {
    let table = Arc::new(table);

    let t0 = Instant::now();
    let params = CvParams {
        num_folds: NUM_FOLDS,
        repetitions: REPETITIONS,
        seeds: (0..REPETITIONS as u64).collect(),
        failure_policy: FailurePolicy::SkipRepetition,
        parallelism: Parallelism::Auto,
    };
    let cv = RepeatedCrossValidation::new(params, OrdinaryLeastSquares::default())?;
    let summary = cv.run(table.clone(), RESPONSE, &COVARIATES)?;
    info!("{} repetitions done in {}ms", summary.repetitions(), t0.elapsed().as_millis());

    let (hw_r2, hw_tau) = summary.conventional_half_widths();
    println!(
        "r²:  {:.3} ± {:.4} (1.96 × variance; 1.96 × standard error is {:.4})",
        summary.mean_r_squared, summary.r_squared_spread, hw_r2
    );
    println!(
        "tau: {:.3} ± {:.4} (1.96 × variance; 1.96 × standard error is {:.4})",
        summary.mean_tau, summary.tau_spread, hw_tau
    );
    if summary.skipped > 0 {
        warn!("{} repetitions were skipped", summary.skipped);
    }

    let partition = FoldPartition::new(table.n_rows(), NUM_FOLDS, 0)?;
    let result = cross_validate(
        &table,
        &OrdinaryLeastSquares::default(),
        RESPONSE,
        &COVARIATES,
        &partition,
    )?;
    plot_observed_vs_predicted(
        result.observed(),
        result.predicted(),
        &format!("{}-fold cross-validation, seed 0", NUM_FOLDS),
        "img/cross_validation.png",
        IMG_DIMS,
    )?;

    Ok(())
}

fn spatial_prediction(table: &SampleTable) -> DynResult<()> {
    let model = full_model(table)?;

    let layers = COVARIATES
        .iter()
        .map(|name| -> DynResult<(&'static str, RasterGrid)> {
            Ok((*name, read_ascii_grid_file(format!("{}/{}.asc", GRID_DIR, name))?))
        })
        .collect::<DynResult<Vec<_>>>()?;
    let named: Vec<(&str, &RasterGrid)> = layers.iter().map(|(n, g)| (*n, g)).collect();
    let prediction = predict_raster_by_name(&named, &model)?;
    info!("predicted {} cells", prediction.valid_count());

    let land_cover = read_ascii_grid_file(LAND_COVER_GRID)?;
    let mask = mask_by_category(&land_cover, &BTreeSet::from(KEEP_LAND_COVER));
    let masked = apply_mask(&prediction, &mask)?;
    info!("{} cells remain after masking by land cover", masked.valid_count());

    write_ascii_grid_file(&masked, "img/predicted_logDD.asc")?;
    plot_raster(&masked, "predicted logDD", "img/predicted_logDD.png", IMG_DIMS)?;

    Ok(())
}
