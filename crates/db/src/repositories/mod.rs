mod connection_repository;
mod run_repository;
mod task_repository;

pub use connection_repository::ConnectionRepository;
pub use run_repository::RunRepository;
pub use task_repository::TaskRepository;
