pub mod data;
pub mod view;
