pub mod model;
mod resolver;
mod repository;

pub use repository::ReportRepository;
