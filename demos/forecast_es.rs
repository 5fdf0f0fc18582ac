use std::env;
use tmax_forecast::{ForecastError, ForecastSettings, Forecaster};

#[tokio::main]
async fn main() -> Result<(), ForecastError> {
    configure_polars_display();
    let forecaster = Forecaster::open_meteo(ForecastSettings::default())?;

    let now = forecaster.current_observation().await?;
    println!(
        "Latest observed maximum at {}: {:.1} °C on {} ({:+.1} °C vs previous day)",
        forecaster.settings().location,
        now.value,
        now.date,
        now.delta()
    );

    let features = forecaster.features().await?;
    println!("{}", features.frame().tail(Some(5)));

    let model = forecaster.model().await?;
    println!("{model}");
    if let Some(diagnostics) = model.diagnostics() {
        println!(
            "fit on {} rows, R² = {:.3}, RMSE = {:.2} °C",
            diagnostics.rows, diagnostics.r_squared, diagnostics.rmse
        );
    }

    for point in forecaster.forecast(7).await? {
        println!("{}  {:>5.1} °C", point.date, point.value);
    }

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "10");
}
