pub mod accounts;
pub mod convert;
pub mod setup;
pub mod total;
pub mod ui;
