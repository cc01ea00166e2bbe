//! Integration tests for log-harvester.
//!
//! Harvest and resume tests run against the in-memory store. The S3 tests
//! need LocalStack and are marked `#[ignore]`.
//!
//! ## Running the S3 tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    ```
//!
//! 2. Run the ignored tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod harvest_test;
mod resume_test;
mod s3_test;
