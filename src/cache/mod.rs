pub mod series_cache;
