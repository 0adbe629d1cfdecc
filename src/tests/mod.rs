pub mod utils;

mod pipeline_tests;
mod warehouse_tests;
