//! Method policy table.

use std::collections::HashMap;

/// Fully qualified gRPC method paths served by this crate.
pub mod methods {
    /// `UserService.Register`
    pub const REGISTER: &str = "/library.UserService/Register";
    /// `UserService.Login`
    pub const LOGIN: &str = "/library.UserService/Login";
    /// `LibraryService.AddBook`
    pub const ADD_BOOK: &str = "/library.LibraryService/AddBook";
    /// `LibraryService.UpdateBook`
    pub const UPDATE_BOOK: &str = "/library.LibraryService/UpdateBook";
    /// `LibraryService.DeleteBook`
    pub const DELETE_BOOK: &str = "/library.LibraryService/DeleteBook";
    /// `LibraryService.ListBooks`
    pub const LIST_BOOKS: &str = "/library.LibraryService/ListBooks";
    /// `LibraryService.BatchAddBooks`
    pub const BATCH_ADD_BOOKS: &str = "/library.LibraryService/BatchAddBooks";
}

/// Whether a method needs an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodPolicy {
    /// Anyone may call
    Public,
    /// Bearer token plus live subject required
    Protected,
}

/// Method path -> policy. Paths not in the table are [`MethodPolicy::Protected`].
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    methods: HashMap<String, MethodPolicy>,
}

impl PolicyTable {
    /// Empty table: everything is protected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for the services this crate registers.
    #[must_use]
    pub fn library_default() -> Self {
        Self::new()
            .with_method(methods::REGISTER, MethodPolicy::Public)
            .with_method(methods::LOGIN, MethodPolicy::Public)
            .with_method(methods::ADD_BOOK, MethodPolicy::Protected)
            .with_method(methods::UPDATE_BOOK, MethodPolicy::Protected)
            .with_method(methods::DELETE_BOOK, MethodPolicy::Protected)
            .with_method(methods::LIST_BOOKS, MethodPolicy::Protected)
            .with_method(methods::BATCH_ADD_BOOKS, MethodPolicy::Protected)
    }

    /// Adds or replaces one entry.
    #[must_use]
    pub fn with_method(mut self, path: impl Into<String>, policy: MethodPolicy) -> Self {
        self.methods.insert(path.into(), policy);
        self
    }

    /// Policy for `path`.
    #[must_use]
    pub fn policy_for(&self, path: &str) -> MethodPolicy {
        self.methods
            .get(path)
            .copied()
            .unwrap_or(MethodPolicy::Protected)
    }
}
