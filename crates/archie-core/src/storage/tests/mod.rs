pub mod config_tests;
