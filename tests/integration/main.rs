//! Integration tests for the CourseChat server.

mod helpers;
mod session_test;
mod ws_test;
