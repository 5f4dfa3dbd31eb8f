pub mod ledger_tests;
pub mod proof_tests;
