//! The gateway's route table.
//!
//! Every endpoint is listed once here. The REST router is built from this
//! table and the tool-invocation endpoint advertises the same entries.

use axum::http::Method;
use axum::routing::{MethodRouter, delete, get, post};

use crate::api::{AppState, buckets, files, health};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadRoot,
    HealthCheck,
    ListBuckets,
    CreateBucket,
    DeleteBucket,
    ListFilenames,
    UploadFile,
    DeleteFile,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::ReadRoot,
        Operation::HealthCheck,
        Operation::ListBuckets,
        Operation::CreateBucket,
        Operation::DeleteBucket,
        Operation::ListFilenames,
        Operation::UploadFile,
        Operation::DeleteFile,
    ];

    /// Stable identifier, also used as the tool name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::ReadRoot => "read_root",
            Operation::HealthCheck => "health_check",
            Operation::ListBuckets => "list_buckets",
            Operation::CreateBucket => "create_bucket",
            Operation::DeleteBucket => "delete_bucket",
            Operation::ListFilenames => "list_filenames",
            Operation::UploadFile => "upload_file",
            Operation::DeleteFile => "delete_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn method(self) -> Method {
        match self {
            Operation::ReadRoot
            | Operation::HealthCheck
            | Operation::ListBuckets
            | Operation::ListFilenames => Method::GET,
            Operation::CreateBucket | Operation::UploadFile => Method::POST,
            Operation::DeleteBucket | Operation::DeleteFile => Method::DELETE,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Operation::ReadRoot => "/",
            Operation::HealthCheck => "/healthy",
            Operation::ListBuckets => "/bucketnames",
            Operation::CreateBucket | Operation::DeleteBucket => "/bucket",
            Operation::ListFilenames => "/filenames",
            Operation::UploadFile | Operation::DeleteFile => "/file",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Operation::ReadRoot => "Gateway banner.",
            Operation::HealthCheck => "Check that the object store answers within the timeout.",
            Operation::ListBuckets => "List all bucket names.",
            Operation::CreateBucket => "Create a new bucket.",
            Operation::DeleteBucket => "Delete an existing bucket.",
            Operation::ListFilenames => "List all files in a bucket.",
            Operation::UploadFile => "Upload a file to a bucket.",
            Operation::DeleteFile => "Delete a file from a bucket.",
        }
    }

    /// Grouping label for documentation.
    pub fn tag(self) -> &'static str {
        match self {
            Operation::ReadRoot | Operation::HealthCheck => "gateway",
            Operation::ListBuckets | Operation::CreateBucket | Operation::DeleteBucket => {
                "bucket operations"
            }
            Operation::ListFilenames | Operation::UploadFile | Operation::DeleteFile => {
                "file operations"
            }
        }
    }
}

pub(super) fn method_router<S: Storage>(op: Operation) -> MethodRouter<AppState<S>> {
    match op {
        Operation::ReadRoot => get(health::get_root),
        Operation::HealthCheck => get(health::get_healthy),
        Operation::ListBuckets => get(buckets::get_bucketnames),
        Operation::CreateBucket => post(buckets::post_bucket),
        Operation::DeleteBucket => delete(buckets::delete_bucket),
        Operation::ListFilenames => get(files::get_filenames),
        Operation::UploadFile => post(files::post_file),
        Operation::DeleteFile => delete(files::delete_file),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_round_trip_and_are_unique() {
        let names: HashSet<_> = Operation::ALL.iter().map(|op| op.name()).collect();
        assert_eq!(names.len(), Operation::ALL.len());
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(Operation::from_name("rm_rf"), None);
    }

    #[test]
    fn method_and_path_pairs_are_unique() {
        let routes: HashSet<_> = Operation::ALL
            .iter()
            .map(|op| (op.method(), op.path()))
            .collect();
        assert_eq!(routes.len(), Operation::ALL.len());
    }
}
