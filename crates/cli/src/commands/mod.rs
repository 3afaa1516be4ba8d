pub mod calc;
pub mod inject;
pub mod migrate;
