pub mod sync_indicator;
