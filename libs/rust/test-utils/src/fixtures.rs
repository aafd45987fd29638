//! Test fixtures with sample data.

use uuid::Uuid;

/// Signing secret shared by tests.
pub const TEST_JWT_SECRET: &[u8] = b"library-test-secret-do-not-use";

/// Issuer shared by tests.
pub const TEST_ISSUER: &str = "library-service";

/// Sample book for testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBook {
    /// Catalog id
    pub id: String,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
}

impl SampleBook {
    /// Book with id `id` and generated title/author.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: format!("Title of {id}"),
            author: format!("Author of {id}"),
            id,
        }
    }
}

/// `n` books with ids `book01`, `book02`, ... so id order equals creation order.
#[must_use]
pub fn sample_books(n: usize) -> Vec<SampleBook> {
    (1..=n)
        .map(|i| SampleBook::with_id(format!("book{i:02}")))
        .collect()
}

/// Sample user for testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleUser {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl SampleUser {
    /// The user most scenarios start from.
    #[must_use]
    pub fn alice() -> Self {
        Self {
            username: "alice".to_string(),
            password: "wonderland".to_string(),
        }
    }

    /// A second, independent user.
    #[must_use]
    pub fn bob() -> Self {
        Self {
            username: "bob".to_string(),
            password: "builder".to_string(),
        }
    }

    /// A user whose name will not collide with any other test.
    #[must_use]
    pub fn unique() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            username: format!("user_{}", &suffix[..12]),
            password: "pw".to_string(),
        }
    }
}

/// Multi-threaded runtime for driving async code from proptest bodies.
///
/// # Panics
///
/// Panics if the runtime cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build test runtime")
}
