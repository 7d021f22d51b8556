pub mod evaluate;
pub mod market;
pub mod preset;
pub mod price;
