pub mod analysis;
pub mod criteria;
pub mod resume;
