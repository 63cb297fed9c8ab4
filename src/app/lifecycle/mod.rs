pub mod context;
pub mod startup;
