//! Job record repository.
//!
//! This crate provides:
//! - The `JobRepository` boundary (get / put / compare-and-set by id)
//! - A Redis backend for durable, multi-process deployments
//! - An in-memory backend for tests and single-process use
//! - `mutate_job`, an optimistic read-modify-write loop over compare-and-set

pub mod error;
pub mod memory;
pub mod redis_repo;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryJobRepository;
pub use redis_repo::{RedisJobRepository, RedisRepoConfig, JOB_RECORD_TTL_SECS};
pub use repository::{mutate_job, JobRepository, MAX_CAS_ATTEMPTS};
