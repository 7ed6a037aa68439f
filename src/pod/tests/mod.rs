//! Unit tests for the pod lifecycle module.

mod service_tests;
