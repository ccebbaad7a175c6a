pub mod declaration_tests;
pub mod enhancer_tests;
