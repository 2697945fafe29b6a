pub mod edit;
pub mod export;
pub mod pages;
pub mod resolve;
pub mod scan;
