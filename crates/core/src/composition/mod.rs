pub mod result_composer;
