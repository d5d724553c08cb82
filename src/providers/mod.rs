pub mod hexarate;

pub use hexarate::HexarateSource;
