//! Integration tests for `devinit init` against a mock registry.

mod init_tests;
