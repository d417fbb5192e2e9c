//! Unit tests for the public model, security and mutation types.

mod fetch_hints_test;
mod mutation_test;
mod security_test;
