pub mod forecast_point;
pub mod location;
pub mod series;
