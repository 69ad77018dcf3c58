//! Unit test modules.

mod config_test;
mod ftms_parser_test;
mod speed_model_test;
mod workout_engine_test;
