//! End-to-end tests driving the controller and session together.

mod scenario_tests;
